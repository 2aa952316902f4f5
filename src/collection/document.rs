use crate::constants::names::ROOT_CATEGORY;
use crate::errors::CollectionError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::Path;

/// A Postman-style API collection: `info` plus a tree of folders and requests.
///
/// Loading is lenient below the top level. An item or field with an
/// unexpected shape is dropped on its own and the rest of the tree is kept.
#[derive(Debug, Clone, Deserialize)]
pub struct Collection {
    pub info: Value,
    #[serde(deserialize_with = "lenient_items")]
    pub item: Vec<Item>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Item {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_children")]
    pub item: Option<Vec<Item>>,
    #[serde(default, deserialize_with = "lenient")]
    pub request: Option<RequestSpec>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<Description>,
}

/// Postman allows a request to be a bare URL string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RequestSpec {
    Url(String),
    Full(Request),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Request {
    #[serde(default, deserialize_with = "lenient")]
    pub method: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<RequestUrl>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<Description>,
}

impl RequestSpec {
    fn into_request(self) -> Request {
        match self {
            RequestSpec::Url(raw) => Request {
                url: Some(RequestUrl::Raw(raw)),
                ..Request::default()
            },
            RequestSpec::Full(request) => request,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RequestUrl {
    Raw(String),
    Detailed {
        #[serde(default, deserialize_with = "lenient")]
        raw: Option<String>,
        #[serde(default, deserialize_with = "lenient_list")]
        variable: Vec<UrlVariable>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct UrlVariable {
    #[serde(default, deserialize_with = "lenient")]
    pub key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Description {
    Text(String),
    Rich {
        #[serde(default, deserialize_with = "lenient")]
        content: Option<String>,
    },
}

/// Any value that does not fit `T` reads as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Keeps the elements that fit `T`; a non-array reads as empty.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(values) => values
            .into_iter()
            .filter_map(|value| serde_json::from_value(value).ok())
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_items<'de, D>(deserializer: D) -> Result<Vec<Item>, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_list(deserializer)
}

fn lenient_children<'de, D>(deserializer: D) -> Result<Option<Vec<Item>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(_) => Some(lenient_list(value).unwrap_or_default()),
        _ => None,
    })
}

impl Description {
    fn text(&self) -> &str {
        match self {
            Description::Text(text) => text,
            Description::Rich { content } => content.as_deref().unwrap_or(""),
        }
    }
}

/// One endpoint as declared in the collection, before any naming happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTemplate {
    pub trail: Vec<String>,
    pub name: String,
    pub method: String,
    pub raw_url: String,
    pub variables: Vec<String>,
    pub description: String,
}

impl RequestTemplate {
    pub fn category(&self) -> &str {
        self.trail
            .first()
            .map(String::as_str)
            .filter(|name| !name.is_empty())
            .unwrap_or(ROOT_CATEGORY)
    }
}

impl Collection {
    pub fn load(path: &Path) -> Result<Self, CollectionError> {
        if !path.exists() {
            return Err(CollectionError::NotFound(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path).map_err(|source| CollectionError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, CollectionError> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_value(value)
    }

    /// Structural checks run before deserializing so that a missing `info` or
    /// an empty `item` array is reported as such rather than as a serde error.
    pub fn from_value(value: Value) -> Result<Self, CollectionError> {
        let obj = value.as_object().ok_or(CollectionError::MissingInfo)?;
        if obj.get("info").map(Value::is_null).unwrap_or(true) {
            return Err(CollectionError::MissingInfo);
        }
        match obj.get("item") {
            Some(Value::Array(items)) if items.is_empty() => {
                return Err(CollectionError::EmptyItems);
            }
            Some(Value::Array(_)) => {}
            _ => return Err(CollectionError::MissingItems),
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn top_level_folders(&self) -> Vec<String> {
        self.item
            .iter()
            .map(|item| item.name.clone().unwrap_or_default())
            .collect()
    }

    /// Flattens the folder tree into request templates, depth-first, in
    /// document order.
    pub fn requests(&self) -> Vec<RequestTemplate> {
        let mut out = Vec::new();
        collect_requests(&self.item, &[], &mut out);
        out
    }
}

fn collect_requests(items: &[Item], trail: &[String], out: &mut Vec<RequestTemplate>) {
    for item in items {
        let name = item.name.clone().unwrap_or_default();
        if let Some(spec) = &item.request {
            let request = spec.clone().into_request();
            out.push(template_from_request(item, &request, trail, &name));
        }
        if let Some(children) = &item.item {
            let mut next = trail.to_vec();
            next.push(name);
            collect_requests(children, &next, out);
        }
    }
}

fn template_from_request(
    item: &Item,
    request: &Request,
    trail: &[String],
    name: &str,
) -> RequestTemplate {
    let method = request
        .method
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or("GET")
        .to_uppercase();
    let (raw_url, variables) = match &request.url {
        Some(RequestUrl::Raw(raw)) => (raw.clone(), Vec::new()),
        Some(RequestUrl::Detailed { raw, variable }) => (
            raw.clone().unwrap_or_default(),
            variable.iter().filter_map(|v| v.key.clone()).collect(),
        ),
        None => (String::new(), Vec::new()),
    };
    let description = item
        .description
        .as_ref()
        .map(Description::text)
        .filter(|text| !text.is_empty())
        .or_else(|| request.description.as_ref().map(Description::text))
        .unwrap_or("")
        .to_string();

    RequestTemplate {
        trail: trail.to_vec(),
        name: name.to_string(),
        method,
        raw_url,
        variables,
        description,
    }
}
