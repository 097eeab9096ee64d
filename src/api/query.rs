//! Translation of list query-string parameters into filter, sort and page
//! directives.
//!
//! Filters are a closed set of kinds ([`Filter`]) collected into a
//! [`FilterSpec`]; each kind is translated to its MongoDB form independently.

use std::collections::HashMap;

use mongodb::bson::{doc, Bson, Document};

use crate::error::AppError;

/// Sentinel meaning "no restriction" for categorical filters.
pub const ALL: &str = "All";

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 12;

/// Raw query-string parameters of a list request.
#[derive(Debug, Clone, Default)]
pub struct ListParams(HashMap<String, String>);

impl ListParams {
    pub fn new(params: HashMap<String, String>) -> Self {
        Self(params)
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    /// Value of `key`, treating an empty string as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    /// Categorical value of `key`, absent when missing or equal to `"All"`.
    pub fn category(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| *v != ALL)
    }

    /// True only when `key` is exactly `"true"`.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key) == Some("true")
    }

    /// Comma-separated list under `key`, each element trimmed.
    pub fn list(&self, key: &str) -> Option<Vec<String>> {
        let values: Vec<String> = self
            .get(key)?
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();
        (!values.is_empty()).then_some(values)
    }

    /// Floating-point value of `key`; a non-numeric value is a client error.
    pub fn number(&self, key: &str) -> Result<Option<f64>, AppError> {
        self.get(key)
            .map(|raw| {
                raw.trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| {
                        AppError::BadRequest(format!("Invalid {key} parameter: '{raw}' is not a number"))
                    })
            })
            .transpose()
    }

    /// Integer value of `key`, or `default` when absent. No range check.
    pub fn integer(&self, key: &str, default: i64) -> Result<i64, AppError> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse::<i64>().map_err(|_| {
                AppError::BadRequest(format!("Invalid {key} parameter: '{raw}' is not an integer"))
            }),
        }
    }
}

/// One predicate of a list query.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Full-text match over the collection's text index.
    TextSearch(String),
    Equals { field: String, value: Bson },
    /// Inclusive numeric range; either bound may be absent.
    Range {
        field: String,
        min: Option<f64>,
        max: Option<f64>,
    },
    /// Matches when the array field shares at least one element with `values`.
    AnyOf { field: String, values: Vec<String> },
}

impl Filter {
    pub fn equals(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Filter::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    fn to_entry(&self) -> (String, Bson) {
        match self {
            Filter::TextSearch(text) => ("$text".to_string(), doc! { "$search": text.clone() }.into()),
            Filter::Equals { field, value } => (field.clone(), value.clone()),
            Filter::Range { field, min, max } => {
                let mut range = Document::new();
                if let Some(min) = min {
                    range.insert("$gte", *min);
                }
                if let Some(max) = max {
                    range.insert("$lte", *max);
                }
                (field.clone(), range.into())
            }
            Filter::AnyOf { field, values } => (field.clone(), doc! { "$in": values.clone() }.into()),
        }
    }
}

/// Conjunction of filters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    filters: Vec<Filter>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn push(&mut self, filter: Filter) {
        self.filters.push(filter);
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn has_text_search(&self) -> bool {
        self.filters
            .iter()
            .any(|f| matches!(f, Filter::TextSearch(_)))
    }

    pub fn to_document(&self) -> Document {
        self.filters.iter().map(Filter::to_entry).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// `"asc"` or `"desc"`; anything else yields `default`.
    pub fn parse(raw: Option<&str>, default: SortDirection) -> Self {
        match raw {
            Some("asc") => SortDirection::Asc,
            Some("desc") => SortDirection::Desc,
            _ => default,
        }
    }

    fn as_i32(self) -> i32 {
        match self {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    /// Text-match score; only meaningful alongside a text search.
    Relevance,
    Field {
        name: String,
        direction: SortDirection,
    },
}

/// Ordered sort keys, highest priority first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortSpec {
    keys: Vec<SortKey>,
}

impl SortSpec {
    pub fn by(name: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            keys: vec![SortKey::Field {
                name: name.into(),
                direction,
            }],
        }
    }

    /// Put relevance ahead of every other key.
    pub fn relevance_first(mut self) -> Self {
        self.keys.retain(|k| *k != SortKey::Relevance);
        self.keys.insert(0, SortKey::Relevance);
        self
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn to_document(&self) -> Document {
        self.keys
            .iter()
            .map(|key| match key {
                SortKey::Relevance => ("score".to_string(), doc! { "$meta": "textScore" }.into()),
                SortKey::Field { name, direction } => {
                    (name.clone(), Bson::Int32(direction.as_i32()))
                }
            })
            .collect()
    }
}

/// Requested page, as given by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub limit: i64,
}

impl PageWindow {
    pub fn from_params(params: &ListParams) -> Result<Self, AppError> {
        Ok(Self {
            page: params.integer("page", DEFAULT_PAGE)?,
            limit: params.integer("limit", DEFAULT_LIMIT)?,
        })
    }

    /// Documents to skip; `None` when the product is negative.
    pub fn skip(&self) -> Option<u64> {
        let skip = self.page.saturating_sub(1).saturating_mul(self.limit);
        u64::try_from(skip).ok()
    }
}

/// Everything a repository needs to run one list request.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub filter: FilterSpec,
    pub sort: SortSpec,
    pub window: PageWindow,
}

fn resolve_sort(
    params: &ListParams,
    filter: &FilterSpec,
    field: String,
    default_direction: SortDirection,
) -> SortSpec {
    let direction = SortDirection::parse(params.get("sortOrder"), default_direction);
    let sort = SortSpec::by(field, direction);
    if filter.has_text_search() {
        sort.relevance_first()
    } else {
        sort
    }
}

fn push_text_search(params: &ListParams, filter: &mut FilterSpec) {
    if let Some(search) = params.get("search") {
        filter.push(Filter::TextSearch(search.to_string()));
    }
}

fn push_price_range(
    params: &ListParams,
    field: &str,
    filter: &mut FilterSpec,
) -> Result<(), AppError> {
    let min = params.number("minPrice")?;
    let max = params.number("maxPrice")?;
    if min.is_some() || max.is_some() {
        filter.push(Filter::Range {
            field: field.to_string(),
            min,
            max,
        });
    }
    Ok(())
}

/// `GET /api/destinations`: active only, region, featured, lowercased tags,
/// price range on `startingPrice`; sort vocabulary defaults to `name` ascending.
pub fn destination_query(params: &ListParams) -> Result<ListQuery, AppError> {
    let mut filter = FilterSpec::new().with(Filter::equals("isActive", true));
    push_text_search(params, &mut filter);

    if let Some(region) = params.category("region") {
        filter.push(Filter::equals("region", region));
    }
    if params.flag("featured") {
        filter.push(Filter::equals("featured", true));
    }
    if let Some(tags) = params.list("tags") {
        filter.push(Filter::AnyOf {
            field: "tags".to_string(),
            values: tags.iter().map(|t| t.to_lowercase()).collect(),
        });
    }
    push_price_range(params, "startingPrice", &mut filter)?;

    let field = match params.get("sortBy") {
        Some("price") => "startingPrice",
        Some("rating") => "averageRating",
        Some("reviews") => "reviewCount",
        _ => "name",
    };
    let sort = resolve_sort(params, &filter, field.to_string(), SortDirection::Asc);

    Ok(ListQuery {
        filter,
        sort,
        window: PageWindow::from_params(params)?,
    })
}

/// `GET /api/blog`: active only, category, featured, tags matched verbatim;
/// `sortBy` is used as the field name as given, default `publishedAt` descending.
pub fn post_query(params: &ListParams) -> Result<ListQuery, AppError> {
    let mut filter = FilterSpec::new().with(Filter::equals("isActive", true));
    push_text_search(params, &mut filter);

    if let Some(category) = params.category("category") {
        filter.push(Filter::equals("category", category));
    }
    if params.flag("featured") {
        filter.push(Filter::equals("featured", true));
    }
    if let Some(tags) = params.list("tags") {
        filter.push(Filter::AnyOf {
            field: "tags".to_string(),
            values: tags,
        });
    }

    let field = params.get("sortBy").unwrap_or("publishedAt").to_string();
    let sort = resolve_sort(params, &filter, field, SortDirection::Desc);

    Ok(ListQuery {
        filter,
        sort,
        window: PageWindow::from_params(params)?,
    })
}

/// `GET /api/packages`: category, difficulty, destination, featured, price
/// range on `price`; default sort `rating` descending.
pub fn package_query(params: &ListParams) -> Result<ListQuery, AppError> {
    let mut filter = FilterSpec::new();
    push_text_search(params, &mut filter);

    if let Some(category) = params.category("category") {
        filter.push(Filter::equals("category", category));
    }
    if let Some(difficulty) = params.category("difficulty") {
        filter.push(Filter::equals("difficulty", difficulty));
    }
    if let Some(destination) = params.get("destination") {
        filter.push(Filter::equals("destination", destination));
    }
    if params.flag("featured") {
        filter.push(Filter::equals("featured", true));
    }
    push_price_range(params, "price", &mut filter)?;

    let field = match params.get("sortBy") {
        Some("price") => "price",
        Some("reviews") => "reviewCount",
        Some("title") => "title",
        Some("departure") => "departureDate",
        _ => "rating",
    };
    let sort = resolve_sort(params, &filter, field.to_string(), SortDirection::Desc);

    Ok(ListQuery {
        filter,
        sort,
        window: PageWindow::from_params(params)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_defaults() {
        let query = destination_query(&ListParams::default()).unwrap();
        assert_eq!(query.filter.to_document(), doc! { "isActive": true });
        assert_eq!(query.sort.to_document(), doc! { "name": 1 });
        assert_eq!(query.window, PageWindow { page: 1, limit: 12 });
    }

    #[test]
    fn test_featured_only_applies_for_exact_true() {
        for value in ["false", "TRUE", "1", "yes", ""] {
            let params = ListParams::from_pairs([("featured", value)]);
            let query = destination_query(&params).unwrap();
            assert!(
                !query.filter.to_document().contains_key("featured"),
                "featured={value} must not filter"
            );
        }

        let params = ListParams::from_pairs([("featured", "true")]);
        let query = destination_query(&params).unwrap();
        assert!(query.filter.to_document().get_bool("featured").unwrap());
    }

    #[test]
    fn test_all_sentinel_is_ignored() {
        let with_all = destination_query(&ListParams::from_pairs([("region", "All")])).unwrap();
        let omitted = destination_query(&ListParams::default()).unwrap();
        assert_eq!(with_all.filter, omitted.filter);

        let posts = post_query(&ListParams::from_pairs([("category", "All")])).unwrap();
        assert!(!posts.filter.to_document().contains_key("category"));

        let asia = destination_query(&ListParams::from_pairs([("region", "Asia")])).unwrap();
        assert_eq!(asia.filter.to_document().get_str("region").unwrap(), "Asia");
    }

    #[test]
    fn test_destination_tags_are_lowercased_but_post_tags_are_not() {
        let params = ListParams::from_pairs([("tags", " Beach , Luxury")]);

        let dest = destination_query(&params).unwrap();
        assert_eq!(
            dest.filter.to_document().get_document("tags").unwrap(),
            &doc! { "$in": ["beach", "luxury"] }
        );

        let post = post_query(&params).unwrap();
        assert_eq!(
            post.filter.to_document().get_document("tags").unwrap(),
            &doc! { "$in": ["Beach", "Luxury"] }
        );
    }

    #[test]
    fn test_empty_tag_elements_are_dropped() {
        let params = ListParams::from_pairs([("tags", "beach,, ,")]);
        let query = destination_query(&params).unwrap();
        assert_eq!(
            query.filter.to_document().get_document("tags").unwrap(),
            &doc! { "$in": ["beach"] }
        );

        let only_commas = ListParams::from_pairs([("tags", ",,")]);
        let query = destination_query(&only_commas).unwrap();
        assert!(!query.filter.to_document().contains_key("tags"));
    }

    #[test]
    fn test_price_bounds_are_independent() {
        let min_only = destination_query(&ListParams::from_pairs([("minPrice", "500")])).unwrap();
        assert_eq!(
            min_only.filter.to_document().get_document("startingPrice").unwrap(),
            &doc! { "$gte": 500.0 }
        );

        let max_only = destination_query(&ListParams::from_pairs([("maxPrice", "2000.5")])).unwrap();
        assert_eq!(
            max_only.filter.to_document().get_document("startingPrice").unwrap(),
            &doc! { "$lte": 2000.5 }
        );

        let both = destination_query(&ListParams::from_pairs([
            ("minPrice", "100"),
            ("maxPrice", "900"),
        ]))
        .unwrap();
        assert_eq!(
            both.filter.to_document().get_document("startingPrice").unwrap(),
            &doc! { "$gte": 100.0, "$lte": 900.0 }
        );
    }

    #[test]
    fn test_malformed_numbers_are_rejected() {
        let err = destination_query(&ListParams::from_pairs([("minPrice", "cheap")])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("minPrice")));

        let err = destination_query(&ListParams::from_pairs([("page", "two")])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("page")));

        let err = post_query(&ListParams::from_pairs([("limit", "1.5")])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("limit")));
    }

    #[test]
    fn test_search_puts_relevance_before_explicit_sort() {
        let params = ListParams::from_pairs([
            ("search", "island"),
            ("sortBy", "price"),
            ("sortOrder", "desc"),
        ]);
        let query = destination_query(&params).unwrap();

        assert_eq!(
            query.filter.to_document().get_document("$text").unwrap(),
            &doc! { "$search": "island" }
        );

        let sort = query.sort.to_document();
        let keys: Vec<&str> = sort.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["score", "startingPrice"]);
        assert_eq!(sort.get_document("score").unwrap(), &doc! { "$meta": "textScore" });
        assert_eq!(sort.get_i32("startingPrice").unwrap(), -1);
    }

    #[test]
    fn test_destination_sort_vocabulary() {
        let cases = [
            ("price", "startingPrice"),
            ("rating", "averageRating"),
            ("reviews", "reviewCount"),
            ("name", "name"),
            ("country", "name"),
        ];
        for (sort_by, field) in cases {
            let query = destination_query(&ListParams::from_pairs([("sortBy", sort_by)])).unwrap();
            assert_eq!(query.sort.to_document(), doc! { field: 1 }, "sortBy={sort_by}");
        }
    }

    #[test]
    fn test_post_sort_passes_field_through() {
        let query = post_query(&ListParams::default()).unwrap();
        assert_eq!(query.sort.to_document(), doc! { "publishedAt": -1 });

        let params = ListParams::from_pairs([("sortBy", "$where"), ("sortOrder", "asc")]);
        let query = post_query(&params).unwrap();
        assert_eq!(query.sort.to_document(), doc! { "$where": 1 });

        let params = ListParams::from_pairs([("sortOrder", "sideways")]);
        let query = post_query(&params).unwrap();
        assert_eq!(query.sort.to_document(), doc! { "publishedAt": -1 });
    }

    #[test]
    fn test_package_query() {
        let params = ListParams::from_pairs([
            ("category", "Beach"),
            ("difficulty", "All"),
            ("destination", "Maldives"),
            ("maxPrice", "3000"),
            ("sortBy", "departure"),
            ("sortOrder", "asc"),
        ]);
        let query = package_query(&params).unwrap();

        assert_eq!(
            query.filter.to_document(),
            doc! {
                "category": "Beach",
                "destination": "Maldives",
                "price": { "$lte": 3000.0 },
            }
        );
        assert_eq!(query.sort.to_document(), doc! { "departureDate": 1 });

        let defaults = package_query(&ListParams::default()).unwrap();
        assert_eq!(defaults.filter.to_document(), doc! {});
        assert_eq!(defaults.sort.to_document(), doc! { "rating": -1 });
    }

    #[test]
    fn test_page_window_without_bounds_checks() {
        let window = |page: &str, limit: &str| {
            PageWindow::from_params(&ListParams::from_pairs([("page", page), ("limit", limit)]))
                .unwrap()
        };

        assert_eq!(window("3", "10").skip(), Some(20));
        assert_eq!(window("1", "12").skip(), Some(0));
        // Zero and negative values are accepted as given.
        assert_eq!(window("0", "10"), PageWindow { page: 0, limit: 10 });
        assert_eq!(window("0", "10").skip(), None);
        assert_eq!(window("-2", "5").skip(), None);
        assert_eq!(window("4", "0").skip(), Some(0));
        assert_eq!(window("2", "-5").skip(), None);
    }

    #[test]
    fn test_empty_values_count_as_absent() {
        let params = ListParams::from_pairs([("search", ""), ("page", ""), ("region", "")]);
        let query = destination_query(&params).unwrap();
        assert_eq!(query.filter.to_document(), doc! { "isActive": true });
        assert_eq!(query.window.page, 1);
    }
}
