/// Query parameters: a case-insensitive multi-map
///
/// Keys compare ASCII-case-insensitively but keep the casing they were first
/// inserted with. Insertion order is preserved for serialization.
use std::borrow::Cow;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: Vec<(String, Vec<String>)>,
}

impl QueryParams {
    /// Creates an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a query string, with or without its leading `?`
    ///
    /// `+` decodes to a space, keys without `=` get an empty value and
    /// repeated keys accumulate.
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_navigator::QueryParams;
    ///
    /// let query = QueryParams::parse("?tag=rust&Tag=web&q=hello+world&flag");
    /// assert_eq!(query.get_all("TAG"), vec!["rust", "web"]);
    /// assert_eq!(query.get("q"), Some("hello world"));
    /// assert_eq!(query.get("flag"), Some(""));
    /// ```
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);

        query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                (decode_component(key), decode_component(value))
            })
            .filter(|(key, _)| !key.is_empty())
            .collect()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.params
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(key))
    }

    /// Appends a value, keeping any existing values for the key
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        match self.position(&key) {
            Some(index) => self.params[index].1.push(value.into()),
            None => self.params.push((key, vec![value.into()])),
        }
    }

    /// Sets a single value, discarding existing values for the key
    pub fn replace(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        match self.position(&key) {
            Some(index) => self.params[index].1 = vec![value.into()],
            None => self.params.push((key, vec![value.into()])),
        }
    }

    /// Removes a key and returns its values
    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.position(key).map(|index| self.params.remove(index).1)
    }

    /// First value of a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.position(key)
            .and_then(|index| self.params[index].1.first())
            .map(String::as_str)
    }

    /// Every value of a key, in insertion order (empty if absent)
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.position(key)
            .map(|index| self.params[index].1.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// First value of a key parsed as `T`
    pub fn get_as<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key)?.parse().ok()
    }

    pub fn has(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Key names with their original casing
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|(k, _)| k.as_str())
    }

    /// Iterates `(key, value)` pairs, repeating the key for each value
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params
            .iter()
            .flat_map(|(k, vs)| vs.iter().map(move |v| (k.as_str(), v.as_str())))
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Serializes to `?k=v&k=v2`, or an empty string when there are no pairs
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_navigator::QueryParams;
    ///
    /// let mut query = QueryParams::new();
    /// query.insert("q", "a&b");
    /// query.insert("page", "2");
    /// assert_eq!(query.to_query_string(), "?q=a%26b&page=2");
    /// assert_eq!(QueryParams::new().to_query_string(), "");
    /// ```
    pub fn to_query_string(&self) -> String {
        let pairs: Vec<String> = self
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect();

        if pairs.is_empty() {
            String::new()
        } else {
            format!("?{}", pairs.join("&"))
        }
    }
}

/// Lossy form decoding: `+` is a space, undecodable bytes become U+FFFD
fn decode_component(raw: &str) -> String {
    let spaced: Cow<'_, str> = if raw.contains('+') {
        Cow::Owned(raw.replace('+', " "))
    } else {
        Cow::Borrowed(raw)
    };
    String::from_utf8_lossy(&urlencoding::decode_binary(spaced.as_bytes())).into_owned()
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}
