//! IVMS101 structural prefix tables shared by natural and legal persons.

use crate::path::{Placeholder, Structure, StructureKind};

pub(super) const ADDRESS_LINE: &[Structure] = &[Structure {
    prefix: "addressLine_",
    path: &["addressLine"],
    kind: StructureKind::ScalarList,
    nested: &[],
}];

pub(super) const GEOGRAPHIC_ADDRESS: Structure = Structure {
    prefix: "geographicAddress_",
    path: &["geographicAddress"],
    kind: StructureKind::Indexed(Placeholder::Address("addressLine")),
    nested: ADDRESS_LINE,
};

pub(super) const NAME_IDENTIFIER: Structure = Structure {
    prefix: "name_nameIdentifier_",
    path: &["name", "nameIdentifier"],
    kind: StructureKind::Indexed(Placeholder::Object),
    nested: &[],
};

pub(super) const LOCAL_NAME_IDENTIFIER: Structure = Structure {
    prefix: "name_localNameIdentifier_",
    path: &["name", "localNameIdentifier"],
    kind: StructureKind::Indexed(Placeholder::Object),
    nested: &[],
};

pub(super) const PHONETIC_NAME_IDENTIFIER: Structure = Structure {
    prefix: "name_phoneticNameIdentifier_",
    path: &["name", "phoneticNameIdentifier"],
    kind: StructureKind::Indexed(Placeholder::Object),
    nested: &[],
};

pub(super) const NATIONAL_IDENTIFICATION: Structure = Structure {
    prefix: "nationalIdentification_",
    path: &["nationalIdentification"],
    kind: StructureKind::Object,
    nested: &[],
};

pub(super) const DATE_AND_PLACE_OF_BIRTH: Structure = Structure {
    prefix: "dateAndPlaceOfBirth_",
    path: &["dateAndPlaceOfBirth"],
    kind: StructureKind::Object,
    nested: &[],
};

pub(super) const ACCOUNT_NUMBER: Structure = Structure {
    prefix: "accountNumber_",
    path: &["accountNumber"],
    kind: StructureKind::ScalarList,
    nested: &[],
};

pub(super) const IGNORED_FIELDS: &[&str] = &["search_terms"];
