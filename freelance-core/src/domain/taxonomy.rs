use crate::storage::schema::FieldKind;
use validator::Validate;

entity! {
    /// Top level of the skills and offer taxonomy.
    pub struct Category {
        table: "category",
        entity: "category",
        resource: "categories",
        fields: {
            #[validate(length(max = 128))]
            name: String => ("name", "name", FieldKind::Text),
            active: bool => ("active", "active", FieldKind::Boolean),
        },
        links: {},
    }
}

entity! {
    pub struct Subcategory {
        table: "subcategory",
        entity: "subcategory",
        resource: "subcategories",
        fields: {
            #[validate(length(max = 128))]
            name: String => ("name", "name", FieldKind::Text),
            active: bool => ("active", "active", FieldKind::Boolean),
            #[serde(default)]
            category_id: Option<i64> => ("categoryId", "category_id", FieldKind::Long),
        },
        links: {},
    }
}

entity! {
    pub struct Skill {
        table: "skill",
        entity: "skill",
        resource: "skills",
        fields: {
            #[validate(length(max = 128))]
            name: String => ("name", "name", FieldKind::Text),
            active: bool => ("active", "active", FieldKind::Boolean),
            #[serde(default)]
            category_id: Option<i64> => ("categoryId", "category_id", FieldKind::Long),
        },
        links: {},
    }
}

entity! {
    pub struct Tag {
        table: "tag",
        entity: "tag",
        resource: "tags",
        fields: {
            #[validate(length(max = 64))]
            name: String => ("name", "name", FieldKind::Text),
        },
        links: {},
    }
}

entity! {
    /// Kind of service an offer belongs to, e.g. "Logo design" under a subcategory.
    pub struct OfferType {
        table: "offer_type",
        entity: "offerType",
        resource: "offer-types",
        fields: {
            #[validate(length(max = 50))]
            name: String => ("name", "name", FieldKind::Text),
            active: bool => ("active", "active", FieldKind::Boolean),
            #[serde(default)]
            subcategory_id: Option<i64> => ("subcategoryId", "subcategory_id", FieldKind::Long),
        },
        links: {},
    }
}

entity! {
    pub struct Country {
        table: "country",
        entity: "country",
        resource: "countries",
        fields: {
            #[validate(length(max = 128))]
            name: String => ("name", "name", FieldKind::Text),
            #[serde(default)]
            #[validate(length(max = 2))]
            iso2: Option<String> => ("iso2", "iso_2", FieldKind::Text),
            #[serde(default)]
            #[validate(length(max = 3))]
            iso3: Option<String> => ("iso3", "iso_3", FieldKind::Text),
            #[validate(length(max = 20))]
            region: String => ("region", "region", FieldKind::Text),
            active: bool => ("active", "active", FieldKind::Boolean),
        },
        links: {},
    }
}
