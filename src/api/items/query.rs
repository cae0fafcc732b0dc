use {
    super::model::Item,
    crate::api::extract::{Issue, Validate},
    rust_decimal::Decimal,
    serde::Deserialize,
    std::{cmp::Ordering, fmt},
};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 25;
pub const MAX_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Name,
    #[default]
    Price,
    CreatedAt,
}

impl SortField {
    /// Column the field is stored in.
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Price => "price",
            SortField::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        })
    }
}

/// Raw query string of `GET /api/v1/items`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct ItemQuery {
    /// Page number, starting at 1.
    pub page: Option<u32>,
    /// Page size, between 1 and 100.
    pub limit: Option<u32>,
    /// Case-insensitive substring matched against name and description.
    pub search: Option<String>,
    pub sort: Option<SortField>,
    pub order: Option<SortOrder>,
    /// Inclusive lower price bound.
    pub min_price: Option<u64>,
    /// Inclusive upper price bound.
    pub max_price: Option<u64>,
}

impl Validate for ItemQuery {
    fn validate(&self) -> Vec<Issue> {
        let mut issues = Vec::new();

        if self.page == Some(0) {
            issues.push(Issue::field("page", "must be at least 1"));
        }
        if let Some(limit) = self.limit
            && !(1..=MAX_LIMIT).contains(&limit)
        {
            issues.push(Issue::field(
                "limit",
                format!("must be between 1 and {MAX_LIMIT}"),
            ));
        }
        if self.min_price == Some(0) {
            issues.push(Issue::field("min_price", "must be a positive integer"));
        }
        if self.max_price == Some(0) {
            issues.push(Issue::field("max_price", "must be a positive integer"));
        }
        if let (Some(min), Some(max)) = (self.min_price, self.max_price)
            && min > max
        {
            issues.push(Issue::field(
                "min_price",
                "min_price cannot be greater than max_price",
            ));
        }

        issues
    }
}

/// A validated listing request with every default filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct ListParams {
    pub page: u32,
    pub limit: u32,
    /// Lowercased search term, `None` when absent or blank.
    pub search: Option<String>,
    pub sort: SortField,
    pub order: SortOrder,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

impl Default for ListParams {
    fn default() -> Self {
        ListParams {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            search: None,
            sort: SortField::default(),
            order: SortOrder::default(),
            min_price: None,
            max_price: None,
        }
    }
}

impl From<ItemQuery> for ListParams {
    fn from(query: ItemQuery) -> Self {
        ListParams {
            page: query.page.unwrap_or(DEFAULT_PAGE),
            limit: query.limit.unwrap_or(DEFAULT_LIMIT),
            search: query
                .search
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty()),
            sort: query.sort.unwrap_or_default(),
            order: query.order.unwrap_or_default(),
            min_price: query.min_price.map(Decimal::from),
            max_price: query.max_price.map(Decimal::from),
        }
    }
}

impl ListParams {
    /// Number of matching items to skip before the requested page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    /// Whether `item` passes the search and price filters.
    pub fn matches(&self, item: &Item) -> bool {
        if let Some(min) = self.min_price
            && item.price < min
        {
            return false;
        }
        if let Some(max) = self.max_price
            && item.price > max
        {
            return false;
        }
        match &self.search {
            None => true,
            Some(term) => {
                item.name.to_lowercase().contains(term)
                    || item
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(term))
            }
        }
    }

    /// Orders two items by the requested field and direction, ties broken by id.
    pub fn compare(&self, a: &Item, b: &Item) -> Ordering {
        let ordering = match self.sort {
            SortField::Name => a.name.cmp(&b.name),
            SortField::Price => a.price.cmp(&b.price),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        }
        .then_with(|| a.id.cmp(&b.id));

        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}
