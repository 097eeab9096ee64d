use std::fmt;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use mongodb::bson::doc;
use mongodb::bson::oid::ObjectId;
use mongodb::options::IndexOptions;
use mongodb::IndexModel;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A point in time stored as fixed-width RFC 3339 with millisecond precision.
///
/// The fixed width keeps lexical order equal to chronological order, so
/// sorting on the stored string sorts by time. Inputs may also be a bare
/// `YYYY-MM-DD`, read as midnight UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn parse(raw: &str) -> Option<Self> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(Self(dt.with_timezone(&Utc)));
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| Self(naive.and_utc()))
    }

    /// Calendar date part, `YYYY-MM-DD`.
    pub fn date_string(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Timestamp::parse(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid timestamp '{raw}', expected RFC 3339 or YYYY-MM-DD"
            ))
        })
    }
}

/// A document type with its own collection, write rules and public shape.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + Unpin + 'static {
    /// MongoDB collection name.
    const COLLECTION: &'static str;
    /// Human-readable name used in messages ("Destination", "Blog post").
    const LABEL: &'static str;
    /// Body fields that must be present on create.
    const REQUIRED_FIELDS: &'static [&'static str];
    /// Message returned when a write hits a uniqueness constraint.
    const CONFLICT_MESSAGE: &'static str;

    /// The shape surfaced to API callers.
    type View: Serialize + Send;

    /// Apply write-time normalization (defaults derived from other fields, casing).
    fn normalize(&mut self) {}

    /// Check field-level rules, returning one message per violation.
    fn validate(&self) -> Vec<String>;

    fn into_view(self) -> Self::View;

    /// Indexes the collection needs (text index, uniqueness constraints).
    fn indexes() -> Vec<IndexModel>;
}

/// An entity as persisted, with its storage identifier and timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stored<T> {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(flatten)]
    pub entity: T,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl<T> Stored<T> {
    /// Wrap a freshly built entity with a new identifier and timestamps.
    pub fn new(entity: T) -> Self {
        let now = Timestamp::now();
        Self {
            id: ObjectId::new(),
            entity,
            created_at: now,
            updated_at: now,
        }
    }
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_true() -> bool {
    true
}

fn text_index(name: &str, keys: mongodb::bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().name(name.to_string()).build())
        .build()
}

fn check_rating(field: &str, value: f64, errors: &mut Vec<String>) {
    if !(0.0..=5.0).contains(&value) {
        errors.push(format!("{field} must be between 0 and 5"));
    }
}

fn check_non_negative(field: &str, value: f64, errors: &mut Vec<String>) {
    if value < 0.0 || value.is_nan() {
        errors.push(format!("{field} must be >= 0"));
    }
}

fn check_not_blank(field: &str, value: &str, errors: &mut Vec<String>) {
    if value.trim().is_empty() {
        errors.push(format!("{field} cannot be blank"));
    }
}

// ---------------------------------------------------------------------------
// Destination
// ---------------------------------------------------------------------------

/// Latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A travel destination stored in the `destinations` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    pub name: String,
    pub country: String,
    pub region: String,
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub best_time_to_visit: String,
    /// Aggregate rating, 0 to 5.
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub review_count: u32,
    /// Lowest package price, never negative.
    pub starting_price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Stored lowercased. Duplicates are not removed.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub featured: bool,
}

impl Entity for Destination {
    const COLLECTION: &'static str = "destinations";
    const LABEL: &'static str = "Destination";
    const REQUIRED_FIELDS: &'static [&'static str] =
        &["name", "country", "region", "description", "startingPrice"];
    const CONFLICT_MESSAGE: &'static str = "A destination with these details already exists";

    type View = Destination;

    fn normalize(&mut self) {
        for tag in self.tags.iter_mut() {
            *tag = tag.trim().to_lowercase();
        }
    }

    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        check_not_blank("name", &self.name, &mut errors);
        check_non_negative("startingPrice", self.starting_price, &mut errors);
        check_rating("averageRating", self.average_rating, &mut errors);
        if let Some(coords) = self.coordinates {
            if !(-90.0..=90.0).contains(&coords.latitude) {
                errors.push("coordinates.latitude must be between -90 and 90".to_string());
            }
            if !(-180.0..=180.0).contains(&coords.longitude) {
                errors.push("coordinates.longitude must be between -180 and 180".to_string());
            }
        }
        errors
    }

    fn into_view(self) -> Self::View {
        self
    }

    fn indexes() -> Vec<IndexModel> {
        vec![text_index(
            "destination_text",
            doc! {
                "name": "text",
                "country": "text",
                "region": "text",
                "description": "text",
                "tags": "text",
            },
        )]
    }
}

// ---------------------------------------------------------------------------
// TourPackage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Moderate,
    Challenging,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PackageCategory {
    Adventure,
    Cultural,
    Beach,
    Wildlife,
    Luxury,
    Family,
    Honeymoon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSize {
    pub min: u32,
    pub max: u32,
}

impl Default for GroupSize {
    fn default() -> Self {
        Self { min: 1, max: 12 }
    }
}

/// One day of a package itinerary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryDay {
    pub day: u32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub activities: Vec<String>,
    #[serde(default)]
    pub meals: Vec<String>,
    #[serde(default)]
    pub accommodation: Option<String>,
}

/// A bookable tour stored in the `packages` collection.
///
/// `destination` is the free-text name of a destination, not a reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourPackage {
    pub title: String,
    pub destination: String,
    /// Display duration, e.g. "7 Days / 6 Nights".
    pub duration: String,
    pub price: f64,
    #[serde(default)]
    pub original_price: Option<f64>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub description: String,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub inclusions: Vec<String>,
    #[serde(default)]
    pub exclusions: Vec<String>,
    #[serde(default)]
    pub itinerary: Vec<ItineraryDay>,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub group_size: GroupSize,
    #[serde(default)]
    pub departure_date: Option<Timestamp>,
    #[serde(default)]
    pub available_dates: Vec<Timestamp>,
    pub category: PackageCategory,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub featured: bool,
}

impl Entity for TourPackage {
    const COLLECTION: &'static str = "packages";
    const LABEL: &'static str = "Tour package";
    const REQUIRED_FIELDS: &'static [&'static str] = &[
        "title",
        "destination",
        "duration",
        "price",
        "description",
        "difficulty",
        "category",
    ];
    const CONFLICT_MESSAGE: &'static str = "A tour package with these details already exists";

    type View = TourPackage;

    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        check_not_blank("title", &self.title, &mut errors);
        check_non_negative("price", self.price, &mut errors);
        if let Some(original) = self.original_price {
            check_non_negative("originalPrice", original, &mut errors);
        }
        check_rating("rating", self.rating, &mut errors);
        if self.group_size.min < 1 {
            errors.push("groupSize.min must be >= 1".to_string());
        }
        if self.group_size.min > self.group_size.max {
            errors.push("groupSize.min cannot exceed groupSize.max".to_string());
        }
        for (idx, day) in self.itinerary.iter().enumerate() {
            if day.day < 1 {
                errors.push(format!("itinerary[{idx}].day must be >= 1"));
            }
        }
        errors
    }

    fn into_view(self) -> Self::View {
        self
    }

    fn indexes() -> Vec<IndexModel> {
        vec![text_index(
            "package_text",
            doc! {
                "title": "text",
                "destination": "text",
                "description": "text",
                "highlights": "text",
            },
        )]
    }
}

// ---------------------------------------------------------------------------
// BlogPost
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seo {
    #[serde(default)]
    pub meta_title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// A blog article stored in the `posts` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub title: String,
    /// URL identifier, unique across posts.
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub author: Author,
    #[serde(default = "Timestamp::now")]
    pub published_at: Timestamp,
    /// Minutes; 0 on input means "derive from content".
    #[serde(default)]
    pub read_time: u32,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub featured_image: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub seo: Option<Seo>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub featured: bool,
}

const WORDS_PER_MINUTE: usize = 200;

/// Reading time in minutes, rounded up, at least one.
pub fn estimate_read_time(content: &str) -> u32 {
    let words = content.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1) as u32
}

/// Lowercase ASCII alphanumerics separated by single hyphens.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .split('-')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()))
}

/// Public shape of a blog post: `publishedAt` is a calendar date.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostView {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub author: Author,
    pub published_at: String,
    pub read_time: u32,
    pub category: String,
    pub tags: Vec<String>,
    pub featured_image: String,
    pub images: Vec<String>,
    pub seo: Option<Seo>,
    pub is_active: bool,
    pub featured: bool,
}

impl Entity for BlogPost {
    const COLLECTION: &'static str = "posts";
    const LABEL: &'static str = "Blog post";
    const REQUIRED_FIELDS: &'static [&'static str] =
        &["title", "slug", "excerpt", "content", "author", "category"];
    const CONFLICT_MESSAGE: &'static str = "A blog post with this slug already exists";

    type View = BlogPostView;

    fn normalize(&mut self) {
        if self.read_time == 0 {
            self.read_time = estimate_read_time(&self.content);
        }
    }

    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        check_not_blank("title", &self.title, &mut errors);
        check_not_blank("author.name", &self.author.name, &mut errors);
        if !is_valid_slug(&self.slug) {
            errors.push(format!(
                "slug '{}' must contain only lowercase letters, digits and single hyphens",
                self.slug
            ));
        }
        errors
    }

    fn into_view(self) -> Self::View {
        BlogPostView {
            title: self.title,
            slug: self.slug,
            excerpt: self.excerpt,
            content: self.content,
            author: self.author,
            published_at: self.published_at.date_string(),
            read_time: self.read_time,
            category: self.category,
            tags: self.tags,
            featured_image: self.featured_image,
            images: self.images,
            seo: self.seo,
            is_active: self.is_active,
            featured: self.featured,
        }
    }

    fn indexes() -> Vec<IndexModel> {
        vec![
            text_index(
                "post_text",
                doc! {
                    "title": "text",
                    "excerpt": "text",
                    "content": "text",
                    "tags": "text",
                },
            ),
            IndexModel::builder()
                .keys(doc! { "slug": 1 })
                .options(
                    IndexOptions::builder()
                        .name("slug_unique".to_string())
                        .unique(true)
                        .build(),
                )
                .build(),
        ]
    }
}
