//! IVMS101 code lists offered by select inputs.
//!
//! The lists are immutable. Callers that need a "please select" entry get a fresh list from
//! [`with_placeholder`] instead of editing a shared one.

use serde::Serialize;

/// One option of a select input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Choice<'a> {
    pub value: &'a str,
    pub label: &'a str,
}

const fn choice(value: &'static str, label: &'static str) -> Choice<'static> {
    Choice { value, label }
}

pub const ADDRESS_TYPES: &[Choice<'static>] = &[
    choice("HOME", "Residential"),
    choice("BIZZ", "Business"),
    choice("GEOG", "Geographic"),
    choice("MISC", "Unspecified or Miscellaneous"),
];

pub const NATIONAL_IDENTIFIER_TYPES: &[Choice<'static>] = &[
    choice("ARNU", "Alien Residential Number"),
    choice("CCPT", "Passport Number"),
    choice("RAID", "Registration Authority ID"),
    choice("DRLC", "Driver's License Number"),
    choice("FIIN", "Foreign Investment Identity Number"),
    choice("TXID", "Tax Identification Number"),
    choice("SOCS", "Social Security Number"),
    choice("IDCD", "Identity Card Number"),
    choice("LEIX", "Legal Entity Identifier (LEI)"),
    choice("MISC", "Unspecified or Miscellaneous"),
];

/// Identifier types that only apply to organisations.
const LEGAL_ONLY_IDENTIFIERS: &[&str] = &["LEIX", "TXID", "RAID"];

pub const NATURAL_PERSON_NAME_TYPES: &[Choice<'static>] = &[
    choice("ALIA", "Alias"),
    choice("BIRT", "Birth"),
    choice("MAID", "Maiden"),
    choice("LEGL", "Legal"),
    choice("MISC", "Unspecified"),
];

pub const LEGAL_PERSON_NAME_TYPES: &[Choice<'static>] = &[
    choice("LEGL", "Legal"),
    choice("SHRT", "Short"),
    choice("TRAD", "Trading"),
    choice("MISC", "Unspecified"),
];

/// A new list with an empty-valued placeholder in front of `options`.
pub fn with_placeholder<'a>(options: &[Choice<'a>], text: &'a str) -> Vec<Choice<'a>> {
    let mut list = Vec::with_capacity(options.len() + 1);
    list.push(Choice {
        value: "",
        label: text,
    });
    list.extend_from_slice(options);
    list
}

/// The code lists, addressable by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChoiceKind {
    AddressType,
    NationalIdentifierType,
    /// National identifier types minus the organisation-only ones.
    NaturalPersonIdentifierType,
    NaturalPersonNameType,
    LegalPersonNameType,
}

impl ChoiceKind {
    pub const ALL: [ChoiceKind; 5] = [
        ChoiceKind::AddressType,
        ChoiceKind::NationalIdentifierType,
        ChoiceKind::NaturalPersonIdentifierType,
        ChoiceKind::NaturalPersonNameType,
        ChoiceKind::LegalPersonNameType,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ChoiceKind::AddressType => "address-type",
            ChoiceKind::NationalIdentifierType => "national-identifier-type",
            ChoiceKind::NaturalPersonIdentifierType => "natural-person-identifier-type",
            ChoiceKind::NaturalPersonNameType => "natural-person-name-type",
            ChoiceKind::LegalPersonNameType => "legal-person-name-type",
        }
    }

    pub fn options(self) -> Vec<Choice<'static>> {
        match self {
            ChoiceKind::AddressType => ADDRESS_TYPES.to_vec(),
            ChoiceKind::NationalIdentifierType => NATIONAL_IDENTIFIER_TYPES.to_vec(),
            ChoiceKind::NaturalPersonIdentifierType => NATIONAL_IDENTIFIER_TYPES
                .iter()
                .filter(|c| !LEGAL_ONLY_IDENTIFIERS.contains(&c.value))
                .copied()
                .collect(),
            ChoiceKind::NaturalPersonNameType => NATURAL_PERSON_NAME_TYPES.to_vec(),
            ChoiceKind::LegalPersonNameType => LEGAL_PERSON_NAME_TYPES.to_vec(),
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            ChoiceKind::AddressType => "Select Type of Address",
            ChoiceKind::NationalIdentifierType | ChoiceKind::NaturalPersonIdentifierType => {
                "Select Type of National Identification"
            }
            ChoiceKind::NaturalPersonNameType | ChoiceKind::LegalPersonNameType => {
                "Select Type of Name"
            }
        }
    }

    /// The code a stored value refers to, e.g. `HOME` for `ADDRESS_TYPE_CODE_HOME`.
    ///
    /// Returns `None` when the trailing segment is not a code of this list.
    pub fn normalise(self, value: &str) -> Option<&'static str> {
        let code = value.trim().rsplit('_').next()?;
        self.options()
            .into_iter()
            .find(|c| c.value.eq_ignore_ascii_case(code))
            .map(|c| c.value)
    }
}

impl std::fmt::Display for ChoiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ChoiceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        ChoiceKind::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| format!("unknown choice list '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_prepended_without_touching_the_list() {
        let list = with_placeholder(ADDRESS_TYPES, "Select Type of Address");
        assert_eq!(list.len(), ADDRESS_TYPES.len() + 1);
        assert_eq!(list[0].value, "");
        assert_eq!(list[0].label, "Select Type of Address");
        assert_eq!(list[1], ADDRESS_TYPES[0]);

        // A second call sees the original list, not the first result.
        let again = with_placeholder(ADDRESS_TYPES, "Pick one");
        assert_eq!(again.len(), ADDRESS_TYPES.len() + 1);
        assert_eq!(ADDRESS_TYPES[0].value, "HOME");
    }

    #[test]
    fn parses_kind_names() {
        assert_eq!("address-type".parse::<ChoiceKind>(), Ok(ChoiceKind::AddressType));
        assert_eq!(
            "LEGAL_PERSON_NAME_TYPE".parse::<ChoiceKind>(),
            Ok(ChoiceKind::LegalPersonNameType)
        );
        assert!("colour".parse::<ChoiceKind>().is_err());
        for kind in ChoiceKind::ALL {
            assert_eq!(kind.to_string().parse::<ChoiceKind>(), Ok(kind));
        }
    }

    #[test]
    fn normalises_enum_names_to_codes() {
        assert_eq!(
            ChoiceKind::AddressType.normalise("ADDRESS_TYPE_CODE_HOME"),
            Some("HOME")
        );
        assert_eq!(ChoiceKind::AddressType.normalise("bizz"), Some("BIZZ"));
        assert_eq!(
            ChoiceKind::NationalIdentifierType.normalise("NATIONAL_IDENTIFIER_TYPE_CODE_LEIX"),
            Some("LEIX")
        );
        assert_eq!(ChoiceKind::AddressType.normalise("ADDRESS_TYPE_CODE_NOPE"), None);
    }

    #[test]
    fn natural_person_identifiers_exclude_organisation_codes() {
        let codes: Vec<&str> = ChoiceKind::NaturalPersonIdentifierType
            .options()
            .iter()
            .map(|c| c.value)
            .collect();
        assert!(codes.contains(&"CCPT"));
        assert!(!codes.contains(&"LEIX"));
        assert!(!codes.contains(&"TXID"));
        assert!(!codes.contains(&"RAID"));
    }
}
