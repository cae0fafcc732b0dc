use {
    crate::{
        Error, Result,
        api::extract::{Issue, Validate},
        is_valid_id,
    },
    rust_decimal::Decimal,
    serde::{Deserialize, Serialize},
    time::OffsetDateTime,
};

pub const NAME_MAX_CHARS: usize = 120;
pub const DESCRIPTION_MAX_CHARS: usize = 500;
pub const PRICE_MAX_SCALE: u32 = 2;
pub const PRICE_MAX_DIGITS: usize = 10;

/// A stored item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// 16 characters from `[0-9A-Za-z]`.
    #[cfg_attr(feature = "openapi", schema(example = "a1B2c3D4e5F6g7H8"))]
    pub id: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[cfg_attr(feature = "openapi", schema(value_type = f64, example = 49.99))]
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Item {
    /// Builds a new item with a fresh identifier and both timestamps set to now.
    pub fn new(input: CreateItem) -> Self {
        let now = OffsetDateTime::now_utc();
        Item {
            id: crate::generate_id(),
            name: input.name,
            price: input.price,
            description: input.description,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies the fields present in `patch` and bumps `updated_at`.
    pub fn apply(&mut self, patch: UpdateItem) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        self.updated_at = OffsetDateTime::now_utc();
    }

    /// Replaces every user supplied field and bumps `updated_at`.
    pub fn replace(&mut self, input: CreateItem) {
        self.name = input.name;
        self.price = input.price;
        self.description = input.description;
        self.updated_at = OffsetDateTime::now_utc();
    }

    /// Checks an item read back from storage before it is sent to a client.
    pub fn checked(self) -> Result<Self> {
        let mut issues = Vec::new();
        if !is_valid_id(&self.id) {
            issues.push(Issue::field("id", "Invalid ID format"));
        }
        check_name(&self.name, &mut issues);
        check_price(self.price, &mut issues);
        if let Some(description) = &self.description {
            check_description(description, &mut issues);
        }

        if issues.is_empty() {
            Ok(self)
        } else {
            let joined = issues
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            Err(Error::output_validation(format!(
                "Failed to validate response: {joined}"
            )))
        }
    }
}

/// Body of `POST /api/v1/items` and `PUT /api/v1/items/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateItem {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[cfg_attr(feature = "openapi", schema(value_type = f64, example = 49.99))]
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Validate for CreateItem {
    fn validate(&self) -> Vec<Issue> {
        let mut issues = Vec::new();
        check_name(&self.name, &mut issues);
        check_price(self.price, &mut issues);
        if let Some(description) = &self.description {
            check_description(description, &mut issues);
        }
        issues
    }
}

/// Body of `PATCH /api/v1/items/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<f64>, example = 59.5))]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl UpdateItem {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.price.is_none() && self.description.is_none()
    }
}

impl Validate for UpdateItem {
    fn validate(&self) -> Vec<Issue> {
        if self.is_empty() {
            return vec![Issue::general(
                "At least one field must be provided for update.",
            )];
        }

        let mut issues = Vec::new();
        if let Some(name) = &self.name {
            check_name(name, &mut issues);
        }
        if let Some(price) = self.price {
            check_price(price, &mut issues);
        }
        if let Some(description) = &self.description {
            check_description(description, &mut issues);
        }
        issues
    }
}

/// One page of `GET /api/v1/items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ItemPage {
    pub data: Vec<Item>,
    /// Number of items matching the filters, across all pages.
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

fn check_name(name: &str, issues: &mut Vec<Issue>) {
    let chars = name.chars().count();
    if chars == 0 {
        issues.push(Issue::field("name", "must not be empty"));
    } else if chars > NAME_MAX_CHARS {
        issues.push(Issue::field(
            "name",
            format!("must contain at most {NAME_MAX_CHARS} characters"),
        ));
    }
}

fn check_price(price: Decimal, issues: &mut Vec<Issue>) {
    if price <= Decimal::ZERO {
        issues.push(Issue::field("price", "must be a positive number"));
        return;
    }

    let normalized = price.normalize();
    if normalized.scale() > PRICE_MAX_SCALE {
        issues.push(Issue::field(
            "price",
            format!("must have at most {PRICE_MAX_SCALE} decimal places"),
        ));
    }
    // NUMERIC(10, 2) keeps the scale digits, so the integer part gets the rest.
    let integer_digits = normalized.trunc().mantissa().unsigned_abs().to_string().len();
    if integer_digits > PRICE_MAX_DIGITS - PRICE_MAX_SCALE as usize {
        issues.push(Issue::field(
            "price",
            format!(
                "must have at most {PRICE_MAX_DIGITS} digits, {} before the decimal point",
                PRICE_MAX_DIGITS - PRICE_MAX_SCALE as usize
            ),
        ));
    }
}

fn check_description(description: &str, issues: &mut Vec<Issue>) {
    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        issues.push(Issue::field(
            "description",
            format!("must contain at most {DESCRIPTION_MAX_CHARS} characters"),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn create(name: &str, price: Decimal) -> CreateItem {
        CreateItem {
            name: name.into(),
            price,
            description: None,
        }
    }

    #[test]
    fn test_create_item_valid() {
        assert!(create("Keyboard", dec("49.99")).validate().is_empty());
        assert!(create("Keyboard", dec("12345678.90")).validate().is_empty());
    }

    #[test]
    fn test_create_item_name_bounds() {
        let issues = create("", dec("1")).validate();
        assert_eq!(issues, vec![Issue::field("name", "must not be empty")]);

        let long = "é".repeat(NAME_MAX_CHARS);
        assert!(create(&long, dec("1")).validate().is_empty());

        let too_long = "x".repeat(NAME_MAX_CHARS + 1);
        assert_eq!(create(&too_long, dec("1")).validate().len(), 1);
    }

    #[test]
    fn test_create_item_price_rules() {
        assert_eq!(
            create("a", dec("0")).validate(),
            vec![Issue::field("price", "must be a positive number")]
        );
        assert_eq!(create("a", dec("-3")).validate().len(), 1);
        assert_eq!(
            create("a", dec("1.999")).validate(),
            vec![Issue::field("price", "must have at most 2 decimal places")]
        );
        // trailing zeros do not count
        assert!(create("a", dec("1.500")).validate().is_empty());
        let too_many_digits = vec![Issue::field(
            "price",
            "must have at most 10 digits, 8 before the decimal point",
        )];
        assert_eq!(create("a", dec("123456789.01")).validate(), too_many_digits);
        assert_eq!(create("a", dec("123456789.5")).validate(), too_many_digits);
        assert_eq!(create("a", dec("100000000")).validate(), too_many_digits);
        assert!(create("a", dec("99999999.99")).validate().is_empty());
    }

    #[test]
    fn test_description_limit() {
        let mut input = create("a", dec("1"));
        input.description = Some("d".repeat(DESCRIPTION_MAX_CHARS + 1));
        assert_eq!(input.validate()[0].field, Some("description"));
    }

    #[test]
    fn test_update_item_requires_a_field() {
        let issues = UpdateItem::default().validate();
        assert_eq!(
            issues,
            vec![Issue::general(
                "At least one field must be provided for update."
            )]
        );

        let patch = UpdateItem {
            price: Some(dec("2.5")),
            ..Default::default()
        };
        assert!(patch.validate().is_empty());
    }

    #[test]
    fn test_apply_patch_bumps_updated_at() {
        let mut item = Item::new(create("Mouse", dec("10")));
        let created = item.created_at;
        item.apply(UpdateItem {
            name: Some("Trackball".into()),
            ..Default::default()
        });
        assert_eq!(item.name, "Trackball");
        assert_eq!(item.price, dec("10"));
        assert_eq!(item.created_at, created);
        assert!(item.updated_at >= created);
    }

    #[test]
    fn test_json_shape() {
        let item = Item::new(CreateItem {
            name: "Lamp".into(),
            price: dec("19.99"),
            description: Some("Desk lamp".into()),
        });
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["price"], serde_json::json!(19.99));
        assert!(json["createdAt"].is_string());
        assert!(json["updatedAt"].is_string());
        assert_eq!(json["id"].as_str().unwrap().len(), 16);
    }

    #[test]
    fn test_deserialize_rejects_unknown_fields() {
        let result = serde_json::from_str::<CreateItem>(r#"{"name":"a","price":1,"color":"red"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_checked_catches_corrupt_rows() {
        let mut item = Item::new(create("ok", dec("1")));
        assert!(item.clone().checked().is_ok());
        item.id = "bad".into();
        let err = item.checked().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::OutputValidation);
    }
}
