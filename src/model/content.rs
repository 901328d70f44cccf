use std::sync::Arc;

use rand::Rng;
use snafu::{ensure, Snafu};

/// A category label for recorded engagement events.
///
/// Values are only created through a [Catalog], so every `ContentType` in the
/// process is one of the configured categories.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentType(Arc<str>);

impl ContentType {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ContentType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub const DEFAULT_CONTENT_TYPES: [&str; 4] = ["sports", "entertainment", "business", "education"];

/// The closed set of content types accepted by the service, fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    items: Arc<[ContentType]>,
}

#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[snafu(display("the content catalog must contain at least one content type"))]
    EmptyCatalog,
    #[snafu(display("content type names must not be blank"))]
    BlankContentType,
}

impl Catalog {
    pub fn new<I, S>(names: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut items: Vec<ContentType> = Vec::new();

        for name in names {
            let name = name.as_ref().trim();
            ensure!(!name.is_empty(), BlankContentTypeSnafu);

            if !items.iter().any(|item| item.as_str() == name) {
                items.push(ContentType(name.into()));
            }
        }

        ensure!(!items.is_empty(), EmptyCatalogSnafu);

        Ok(Self {
            items: items.into(),
        })
    }

    /// Look up a content type by its name.
    pub fn get(&self, name: &str) -> Option<&ContentType> {
        self.items.iter().find(|item| item.as_str() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContentType> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Pick a content type uniformly at random.
    pub fn random(&self, rng: &mut impl Rng) -> &ContentType {
        &self.items[rng.gen_range(0..self.items.len())]
    }
}

impl Default for Catalog {
    fn default() -> Self {
        let items: Vec<ContentType> = DEFAULT_CONTENT_TYPES
            .iter()
            .map(|name| ContentType((*name).into()))
            .collect();

        Self {
            items: items.into(),
        }
    }
}
