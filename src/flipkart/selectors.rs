//! CSS selectors for Flipkart HTML parsing.
//!
//! Every selector the pipeline uses lives in [`SelectorTable`]. The defaults
//! below track Flipkart's markup and need updating when its class names rotate;
//! a `[selectors]` table in the config file overrides them without a rebuild.
//!
//! **Update process**: When parsing fails, capture HTML sample,
//! update the defaults, and add test fixture.

use crate::error::{Result, ScrapeError};
use crate::flipkart::models::ReviewField;
use scraper::Selector;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// Default selector strings.
pub mod defaults {
    /// Search result container. The first few are ads and filter panels.
    pub const LISTING: &str = "div.cPHDOP.col-12-12";

    /// Steps from a listing container down to the product anchor.
    pub const PRODUCT_LINK: [&str; 4] = ["div", "div", "div", "a"];

    /// One customer review block.
    pub const REVIEW_CONTAINER: &str = "div.col.EPCmJX.Ma1fCG";

    /// "All reviews" button on the product page.
    pub const ALL_REVIEWS_LINK: &str = "a._1LKTO3";

    pub const NAME_WITHIN: [&str; 2] = ["div", "div"];
    pub const NAME: &str = "p._2NsDsF.AwS1CA";
    pub const RATING: &str = "div.XQDdHH.Ga3i8K";
    pub const HEADING: &str = "p.z9E0IG";
    pub const COMMENT: &str = "div.row";
}

/// Lookup rule for one review field.
///
/// `within` is walked first, each step taking the first descendant that matches;
/// `select` is then searched below wherever the walk ended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldSelector {
    pub within: Vec<String>,
    pub select: String,
}

impl FieldSelector {
    fn new(within: &[&str], select: &str) -> Self {
        Self { within: within.iter().map(|s| s.to_string()).collect(), select: select.to_string() }
    }

    /// Built-in lookup rule for a field.
    pub fn default_for(field: ReviewField) -> Self {
        match field {
            ReviewField::Name => Self::new(&defaults::NAME_WITHIN, defaults::NAME),
            ReviewField::Rating => Self::new(&[], defaults::RATING),
            ReviewField::Heading => Self::new(&[], defaults::HEADING),
            ReviewField::Comment => Self::new(&[], defaults::COMMENT),
        }
    }
}

/// A `[selectors.<field>]` table as written in config. Keys left out keep the
/// field's built-in value.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldOverride {
    within: Option<Vec<String>>,
    select: Option<String>,
}

impl FieldOverride {
    fn apply(self, base: FieldSelector) -> FieldSelector {
        FieldSelector {
            within: self.within.unwrap_or(base.within),
            select: self.select.unwrap_or(base.select),
        }
    }
}

fn merge_field<'de, D>(deserializer: D, field: ReviewField) -> Result<FieldSelector, D::Error>
where
    D: Deserializer<'de>,
{
    let patch = FieldOverride::deserialize(deserializer)?;
    Ok(patch.apply(FieldSelector::default_for(field)))
}

fn name_field<'de, D: Deserializer<'de>>(d: D) -> Result<FieldSelector, D::Error> {
    merge_field(d, ReviewField::Name)
}

fn rating_field<'de, D: Deserializer<'de>>(d: D) -> Result<FieldSelector, D::Error> {
    merge_field(d, ReviewField::Rating)
}

fn heading_field<'de, D: Deserializer<'de>>(d: D) -> Result<FieldSelector, D::Error> {
    merge_field(d, ReviewField::Heading)
}

fn comment_field<'de, D: Deserializer<'de>>(d: D) -> Result<FieldSelector, D::Error> {
    merge_field(d, ReviewField::Comment)
}

/// Every selector the pipeline depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorTable {
    pub listing: String,
    pub product_link: Vec<String>,
    pub review_container: String,
    pub all_reviews_link: String,
    #[serde(deserialize_with = "name_field")]
    pub name: FieldSelector,
    #[serde(deserialize_with = "rating_field")]
    pub rating: FieldSelector,
    #[serde(deserialize_with = "heading_field")]
    pub heading: FieldSelector,
    #[serde(deserialize_with = "comment_field")]
    pub comment: FieldSelector,
}

impl Default for SelectorTable {
    fn default() -> Self {
        Self {
            listing: defaults::LISTING.to_string(),
            product_link: defaults::PRODUCT_LINK.iter().map(|s| s.to_string()).collect(),
            review_container: defaults::REVIEW_CONTAINER.to_string(),
            all_reviews_link: defaults::ALL_REVIEWS_LINK.to_string(),
            name: FieldSelector::default_for(ReviewField::Name),
            rating: FieldSelector::default_for(ReviewField::Rating),
            heading: FieldSelector::default_for(ReviewField::Heading),
            comment: FieldSelector::default_for(ReviewField::Comment),
        }
    }
}

impl SelectorTable {
    /// Returns the lookup rule for a review field.
    pub fn field(&self, field: ReviewField) -> &FieldSelector {
        match field {
            ReviewField::Name => &self.name,
            ReviewField::Rating => &self.rating,
            ReviewField::Heading => &self.heading,
            ReviewField::Comment => &self.comment,
        }
    }

    /// Compiles the table.
    ///
    /// Structural selectors must parse. A broken field selector is only logged:
    /// that field falls back to its placeholder during extraction.
    pub fn compile(&self) -> Result<CompiledSelectors> {
        let product_link = self
            .product_link
            .iter()
            .enumerate()
            .map(|(i, step)| parse(&format!("product_link[{}]", i), step))
            .collect::<Result<Vec<_>>>()?;

        let fields = ReviewField::ALL.map(|field| {
            let lookup = self.compile_field(field);
            if let Err(reason) = &lookup {
                warn!("{} selector unusable, field will use placeholder: {}", field, reason);
            }
            lookup
        });

        Ok(CompiledSelectors {
            listing: parse("listing", &self.listing)?,
            product_link,
            review_container: parse("review_container", &self.review_container)?,
            all_reviews_link: parse("all_reviews_link", &self.all_reviews_link)?,
            fields,
        })
    }

    fn compile_field(&self, field: ReviewField) -> Result<FieldLookup, String> {
        let spec = self.field(field);
        let within = spec
            .within
            .iter()
            .map(|step| parse(field.key(), step).map_err(|e| e.to_string()))
            .collect::<Result<Vec<_>, _>>()?;
        let select = parse(field.key(), &spec.select).map_err(|e| e.to_string())?;
        Ok(FieldLookup { within, select })
    }
}

fn parse(name: &str, css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScrapeError::InvalidSelector {
        name: name.to_string(),
        selector: css.to_string(),
        reason: e.to_string(),
    })
}

/// A compiled field lookup.
#[derive(Debug)]
pub struct FieldLookup {
    pub within: Vec<Selector>,
    pub select: Selector,
}

/// Compiled form of [`SelectorTable`].
#[derive(Debug)]
pub struct CompiledSelectors {
    pub listing: Selector,
    pub product_link: Vec<Selector>,
    pub review_container: Selector,
    pub all_reviews_link: Selector,
    fields: [Result<FieldLookup, String>; 4],
}

impl CompiledSelectors {
    /// Returns the field lookup, or the reason it failed to compile.
    pub fn field(&self, field: ReviewField) -> Result<&FieldLookup, &str> {
        self.fields[field.index()].as_ref().map_err(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_default_selectors_compile() {
        let compiled = SelectorTable::default().compile().unwrap();
        assert_eq!(compiled.product_link.len(), 4);
        for field in ReviewField::ALL {
            assert!(compiled.field(field).is_ok(), "{} failed to compile", field);
        }
        assert_eq!(compiled.field(ReviewField::Name).unwrap().within.len(), 2);
    }

    #[test]
    fn test_listing_selector_matches_both_classes() {
        let compiled = SelectorTable::default().compile().unwrap();
        let html = Html::parse_document(
            r#"<div class="cPHDOP col-12-12">a</div>
               <div class="cPHDOP">b</div>
               <div class="col-12-12 cPHDOP">c</div>"#,
        );
        assert_eq!(html.select(&compiled.listing).count(), 2);
    }

    #[test]
    fn test_invalid_structural_selector_fails() {
        let table = SelectorTable { listing: "div[[".to_string(), ..Default::default() };
        let err = table.compile().unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidSelector { ref name, .. } if name == "listing"));
    }

    #[test]
    fn test_invalid_field_selector_is_contained() {
        let table = SelectorTable {
            rating: FieldSelector { within: Vec::new(), select: ":::".to_string() },
            ..Default::default()
        };
        let compiled = table.compile().unwrap();
        assert!(compiled.field(ReviewField::Rating).is_err());
        assert!(compiled.field(ReviewField::Name).is_ok());
    }

    #[test]
    fn test_partial_toml_override() {
        let table: SelectorTable = toml::from_str(
            r#"
            listing = "div.new-listing"

            [heading]
            select = "h3.title"
            "#,
        )
        .unwrap();

        assert_eq!(table.listing, "div.new-listing");
        assert_eq!(table.heading.select, "h3.title");
        assert_eq!(table.review_container, defaults::REVIEW_CONTAINER);
        assert_eq!(table.name.within, vec!["div", "div"]);
    }

    #[test]
    fn test_field_override_keeps_unset_keys() {
        let table: SelectorTable = toml::from_str(
            r#"
            [name]
            select = "p.reviewer"

            [rating]
            within = ["div"]
            "#,
        )
        .unwrap();

        assert_eq!(table.name.within, vec!["div", "div"]);
        assert_eq!(table.name.select, "p.reviewer");
        assert_eq!(table.rating.within, vec!["div"]);
        assert_eq!(table.rating.select, defaults::RATING);

        let compiled = table.compile().unwrap();
        for field in ReviewField::ALL {
            assert!(compiled.field(field).is_ok(), "{} failed to compile", field);
        }
    }

    #[test]
    fn test_overridden_name_still_uses_nested_path() {
        let table: SelectorTable = toml::from_str("[name]\nselect = \"p.reviewer\"").unwrap();
        let parser = crate::flipkart::Parser::new(&table, 3).unwrap();
        let query = crate::flipkart::Query::new("pixel8").unwrap();

        // The first `p.reviewer` sits outside the div > div path
        let html = r#"<div class="col EPCmJX Ma1fCG">
            <p class="reviewer">Certified Buyer</p>
            <div class="col"><div><p class="reviewer">Meera</p></div></div>
        </div>"#;
        let reviews = parser.extract_reviews(html, &query);
        assert_eq!(reviews[0].name, "Meera");
    }

    #[test]
    fn test_unknown_field_key_rejected() {
        let result: std::result::Result<SelectorTable, _> =
            toml::from_str("[rating]\nselector = \"div.stars\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_field_accessor() {
        let table = SelectorTable::default();
        assert_eq!(table.field(ReviewField::Comment).select, defaults::COMMENT);
        assert_eq!(table.field(ReviewField::Rating).select, defaults::RATING);
    }
}
