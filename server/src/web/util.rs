use crate::data_store::{BookingFilter, BookingOrdering, ListFilter, Ordering, OrderingField};
use serde::de::{Error, Unexpected};
use serde::{Deserialize, Deserializer};

/// URL query parameters of the booking list endpoint
#[derive(Deserialize, Debug, Default)]
pub struct BookingFilterAsQuery {
    /// Case-insensitive search in guest name, phone and user email
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_ordering")]
    pub ordering: Option<BookingOrdering>,
}

impl From<BookingFilterAsQuery> for BookingFilter {
    fn from(value: BookingFilterAsQuery) -> Self {
        BookingFilter {
            search: value.search.filter(|s| !s.is_empty()),
            ordering: value.ordering.unwrap_or_default(),
            ..Default::default()
        }
    }
}

/// URL query parameters of the simple list endpoints (menu, users, restaurants, holidays)
#[derive(Deserialize, Debug)]
#[serde(bound(deserialize = "F: OrderingField"))]
pub struct ListFilterAsQuery<F> {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_ordering")]
    pub ordering: Option<Ordering<F>>,
}

impl<F: OrderingField> From<ListFilterAsQuery<F>> for ListFilter<F> {
    fn from(value: ListFilterAsQuery<F>) -> Self {
        ListFilter {
            search: value.search.filter(|s| !s.is_empty()),
            ordering: value.ordering.unwrap_or_default(),
        }
    }
}

/// Helper function for deserializing an ordering expression like "-booking_date" to an
/// [Ordering] within a struct by deriving `serde::Deserialize` with
/// `#[serde(deserialize_with=...)]`. An empty string means the default ordering.
pub fn deserialize_optional_ordering<'de, D, F>(
    deserializer: D,
) -> Result<Option<Ordering<F>>, D::Error>
where
    D: Deserializer<'de>,
    F: OrderingField,
{
    let value = String::deserialize(deserializer)?;
    if value.is_empty() {
        return Ok(None);
    }
    value.parse().map(Some).map_err(|_| {
        let expected = format!(
            "one of {} (optionally prefixed with '-')",
            F::FIELD_NAMES
                .iter()
                .map(|(name, _)| *name)
                .collect::<Vec<_>>()
                .join(", ")
        );
        D::Error::invalid_value(Unexpected::Str(&value), &expected.as_str())
    })
}

/// URL query parameters of the endpoints which require a branch label
#[derive(Deserialize, Debug)]
pub struct BranchQuery {
    pub branch: Option<String>,
}
