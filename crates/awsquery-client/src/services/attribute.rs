//! `SimpleDB` item attributes.

/// A named attribute of a `SimpleDB` item with its ordered values.
///
/// Values are kept in insertion order and never deduplicated; `SimpleDB`
/// attributes are multi-valued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    item_name: String,
    name: String,
    values: Vec<String>,
}

impl Attribute {
    /// Create an attribute with the given values.
    ///
    /// ```
    /// use awsquery_client::services::Attribute;
    ///
    /// let mut color = Attribute::new("item1", "color", ["red"]);
    /// color.add_value("red");
    /// assert_eq!(color.values(), ["red", "red"]);
    /// ```
    pub fn new<I, V>(item_name: impl Into<String>, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self {
            item_name: item_name.into(),
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Name of the item this attribute belongs to.
    #[must_use]
    pub fn item_name(&self) -> &str {
        &self.item_name
    }

    /// Attribute name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attribute values in order.
    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Append one value.
    pub fn add_value(&mut self, value: impl Into<String>) {
        self.values.push(value.into());
    }

    /// Append several values.
    pub fn add_values<I, V>(&mut self, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.values.extend(values.into_iter().map(Into::into));
    }

    /// Replace all values.
    pub fn set_values<I, V>(&mut self, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.values = values.into_iter().map(Into::into).collect();
    }
}
