// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! WebDAV XML bodies
//!
//! Writes `<multistatus>` documents in the `DAV:` default namespace and
//! reads the two request bodies the adapter cares about: the `<owner>` of a
//! `<lockinfo>` and the property names of a `<propertyupdate>`.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::{NsReader, Reader};
use quick_xml::Writer;
use thiserror::Error;

pub const DAV_NAMESPACE: &str = "DAV:";

#[derive(Debug, Error)]
pub enum DavXmlError {
    #[error("Failed to write XML: {0}")]
    Write(String),

    #[error("Malformed XML body: {0}")]
    Parse(String),
}

/// `<owner>` of a lock request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockOwner {
    pub href: Option<String>,
    pub value: String,
}

/// The single, never-enforced lock handed out by LOCK
#[derive(Debug, Clone)]
pub struct ActiveLock {
    pub token: String,
    pub owner: Option<LockOwner>,
    pub depth: String,
    pub timeout: String,
}

/// A property name qualified by its namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyName {
    pub namespace: Option<String>,
    pub local_name: String,
}

/// Properties reported for one resource
#[derive(Debug, Clone, Default)]
pub struct DavProps {
    pub display_name: Option<String>,
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    pub last_modified: Option<String>,
    pub creation_date: Option<String>,
    /// `Some(true)` marks a collection, `Some(false)` an empty resourcetype
    pub resource_type: Option<bool>,
    pub supported_lock: bool,
    pub lock_discovery: Option<ActiveLock>,
    /// Bare property names echoed back without a value
    pub names: Vec<PropertyName>,
}

#[derive(Debug, Clone)]
pub struct DavResponse {
    pub href: String,
    pub props: DavProps,
    pub status: String,
}

struct XmlOut {
    writer: Writer<Vec<u8>>,
}

impl XmlOut {
    fn new() -> Self {
        Self {
            writer: Writer::new(Vec::new()),
        }
    }

    fn event(&mut self, event: Event<'_>) -> Result<(), DavXmlError> {
        self.writer
            .write_event(event)
            .map_err(|e| DavXmlError::Write(e.to_string()))
    }

    fn start(&mut self, name: &str) -> Result<(), DavXmlError> {
        self.event(Event::Start(BytesStart::new(name)))
    }

    fn end(&mut self, name: &str) -> Result<(), DavXmlError> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn empty(&mut self, name: &str) -> Result<(), DavXmlError> {
        self.event(Event::Empty(BytesStart::new(name)))
    }

    fn text_element(&mut self, name: &str, text: &str) -> Result<(), DavXmlError> {
        self.start(name)?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    fn wrapped_empty(&mut self, outer: &str, inner: &str) -> Result<(), DavXmlError> {
        self.start(outer)?;
        self.empty(inner)?;
        self.end(outer)
    }

    fn into_inner(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}

/// Serialize a `<multistatus>` document
pub fn write_multistatus(responses: &[DavResponse]) -> Result<Vec<u8>, DavXmlError> {
    let mut out = XmlOut::new();
    out.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("multistatus");
    root.push_attribute(("xmlns", DAV_NAMESPACE));
    out.event(Event::Start(root))?;

    for response in responses {
        out.start("response")?;
        out.text_element("href", &response.href)?;
        out.start("propstat")?;
        write_props(&mut out, &response.props)?;
        out.text_element("status", &response.status)?;
        out.end("propstat")?;
        out.end("response")?;
    }

    out.end("multistatus")?;
    Ok(out.into_inner())
}

fn write_props(out: &mut XmlOut, props: &DavProps) -> Result<(), DavXmlError> {
    out.start("prop")?;

    if let Some(name) = &props.display_name {
        out.text_element("displayname", name)?;
    }
    if let Some(length) = props.content_length {
        out.text_element("getcontentlength", &length.to_string())?;
    }
    if let Some(content_type) = &props.content_type {
        out.text_element("getcontenttype", content_type)?;
    }
    if let Some(modified) = &props.last_modified {
        out.text_element("getlastmodified", modified)?;
    }
    if let Some(created) = &props.creation_date {
        out.text_element("creationdate", created)?;
    }
    match props.resource_type {
        Some(true) => out.wrapped_empty("resourcetype", "collection")?,
        Some(false) => out.empty("resourcetype")?,
        None => {}
    }
    if let Some(lock) = &props.lock_discovery {
        out.start("lockdiscovery")?;
        write_active_lock(out, lock)?;
        out.end("lockdiscovery")?;
    }
    if props.supported_lock {
        out.start("supportedlock")?;
        for scope in ["exclusive", "shared"] {
            out.start("lockentry")?;
            out.wrapped_empty("lockscope", scope)?;
            out.wrapped_empty("locktype", "write")?;
            out.end("lockentry")?;
        }
        out.end("supportedlock")?;
    }
    for name in &props.names {
        let mut element = BytesStart::new(name.local_name.as_str());
        if let Some(namespace) = name.namespace.as_deref().filter(|ns| *ns != DAV_NAMESPACE) {
            element.push_attribute(("xmlns", namespace));
        }
        out.event(Event::Empty(element))?;
    }

    out.end("prop")
}

fn write_active_lock(out: &mut XmlOut, lock: &ActiveLock) -> Result<(), DavXmlError> {
    out.start("activelock")?;
    out.wrapped_empty("locktype", "write")?;
    out.wrapped_empty("lockscope", "exclusive")?;
    out.text_element("depth", &lock.depth)?;
    if let Some(owner) = &lock.owner {
        out.start("owner")?;
        match &owner.href {
            Some(href) => out.text_element("href", href)?,
            None => out.event(Event::Text(BytesText::new(&owner.value)))?,
        }
        out.end("owner")?;
    }
    out.text_element("timeout", &lock.timeout)?;
    out.start("locktoken")?;
    out.text_element("href", &lock.token)?;
    out.end("locktoken")?;
    out.end("activelock")
}

/// Extract the `<owner>` of a `<lockinfo>` body, if there is one
pub fn parse_lock_owner(body: &[u8]) -> Result<Option<LockOwner>, DavXmlError> {
    let mut reader = Reader::from_reader(body);
    let mut buf = Vec::new();

    let mut in_owner = false;
    let mut in_href = false;
    let mut owner: Option<LockOwner> = None;

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| DavXmlError::Parse(e.to_string()))?
        {
            Event::Start(e) => match e.local_name().as_ref() {
                b"owner" => {
                    in_owner = true;
                    owner = Some(LockOwner::default());
                }
                b"href" if in_owner => in_href = true,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"owner" => {
                owner = Some(LockOwner::default());
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"owner" => in_owner = false,
                b"href" => in_href = false,
                _ => {}
            },
            Event::Text(text) if in_owner => {
                let text = text
                    .unescape()
                    .map_err(|e| DavXmlError::Parse(e.to_string()))?;
                let text = text.trim();
                if let Some(owner) = owner.as_mut().filter(|_| !text.is_empty()) {
                    if in_href {
                        owner.href = Some(text.to_string());
                    }
                    owner.value.push_str(text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(owner)
}

/// Names of every property a `<propertyupdate>` tries to set or remove
pub fn parse_proppatch_names(body: &[u8]) -> Result<Vec<PropertyName>, DavXmlError> {
    let mut reader = NsReader::from_reader(body);
    let mut buf = Vec::new();

    let mut names = Vec::new();
    // Depth of open elements below the current <prop>, None outside one
    let mut prop_depth: Option<usize> = None;

    loop {
        let (resolved, event) = reader
            .read_resolved_event_into(&mut buf)
            .map_err(|e| DavXmlError::Parse(e.to_string()))?;

        match event {
            Event::Start(e) => match prop_depth {
                Some(depth) => {
                    if depth == 0 {
                        names.push(property_name(&resolved, e.local_name().as_ref()));
                    }
                    prop_depth = Some(depth + 1);
                }
                None if e.local_name().as_ref() == b"prop" => prop_depth = Some(0),
                None => {}
            },
            Event::Empty(e) => {
                if prop_depth == Some(0) {
                    names.push(property_name(&resolved, e.local_name().as_ref()));
                }
            }
            Event::End(_) => {
                prop_depth = match prop_depth {
                    Some(0) | None => None,
                    Some(depth) => Some(depth - 1),
                };
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(names)
}

fn property_name(resolved: &ResolveResult<'_>, local_name: &[u8]) -> PropertyName {
    let namespace = match resolved {
        ResolveResult::Bound(Namespace(ns)) => Some(String::from_utf8_lossy(ns).into_owned()),
        _ => None,
    };
    PropertyName {
        namespace,
        local_name: String::from_utf8_lossy(local_name).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_string(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_collection_response() {
        let xml = as_string(
            write_multistatus(&[DavResponse {
                href: "/.fs/folder/".to_string(),
                props: DavProps {
                    display_name: Some("folder".to_string()),
                    resource_type: Some(true),
                    supported_lock: true,
                    ..Default::default()
                },
                status: "HTTP/1.1 200 OK".to_string(),
            }])
            .unwrap(),
        );

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<multistatus xmlns=\"DAV:\">"));
        assert!(xml.contains("<href>/.fs/folder/</href>"));
        assert!(xml.contains("<resourcetype><collection/></resourcetype>"));
        assert!(xml.contains("<lockscope><shared/></lockscope>"));
        assert!(xml.contains("<status>HTTP/1.1 200 OK</status>"));
        assert!(!xml.contains("getcontentlength"));
    }

    #[test]
    fn test_text_is_escaped() {
        let xml = as_string(
            write_multistatus(&[DavResponse {
                href: "/.fs/a&b.md".to_string(),
                props: DavProps {
                    display_name: Some("a&b.md".to_string()),
                    ..Default::default()
                },
                status: "HTTP/1.1 200 OK".to_string(),
            }])
            .unwrap(),
        );
        assert!(xml.contains("<displayname>a&amp;b.md</displayname>"));
    }

    #[test]
    fn test_lock_discovery() {
        let xml = as_string(
            write_multistatus(&[DavResponse {
                href: "/.fs/a.md".to_string(),
                props: DavProps {
                    lock_discovery: Some(ActiveLock {
                        token: "opaquelocktoken:abc".to_string(),
                        owner: Some(LockOwner {
                            href: Some("mailto:someone@example.com".to_string()),
                            value: "mailto:someone@example.com".to_string(),
                        }),
                        depth: "0".to_string(),
                        timeout: "Second-3600".to_string(),
                    }),
                    ..Default::default()
                },
                status: "HTTP/1.1 200 OK".to_string(),
            }])
            .unwrap(),
        );
        assert!(xml.contains("<locktoken><href>opaquelocktoken:abc</href></locktoken>"));
        assert!(xml.contains("<owner><href>mailto:someone@example.com</href></owner>"));
        assert!(xml.contains("<timeout>Second-3600</timeout>"));
    }

    #[test]
    fn test_parse_lock_owner() {
        let body = br#"<?xml version="1.0" encoding="utf-8"?>
<D:lockinfo xmlns:D="DAV:">
  <D:lockscope><D:exclusive/></D:lockscope>
  <D:locktype><D:write/></D:locktype>
  <D:owner><D:href>http://example.org/~someone</D:href></D:owner>
</D:lockinfo>"#;
        let owner = parse_lock_owner(body).unwrap().unwrap();
        assert_eq!(owner.href.as_deref(), Some("http://example.org/~someone"));

        let body = br#"<lockinfo xmlns="DAV:"><owner>Finder</owner></lockinfo>"#;
        let owner = parse_lock_owner(body).unwrap().unwrap();
        assert_eq!(owner.href, None);
        assert_eq!(owner.value, "Finder");

        assert_eq!(parse_lock_owner(b"").unwrap(), None);
    }

    #[test]
    fn test_parse_proppatch_names() {
        let body = br#"<?xml version="1.0"?>
<D:propertyupdate xmlns:D="DAV:" xmlns:Z="urn:schemas-microsoft-com:">
  <D:set><D:prop><Z:Win32LastModifiedTime>Wed, 01 Jan 2025 00:00:00 GMT</Z:Win32LastModifiedTime></D:prop></D:set>
  <D:remove><D:prop><D:displayname/></D:prop></D:remove>
</D:propertyupdate>"#;
        let names = parse_proppatch_names(body).unwrap();
        assert_eq!(
            names,
            vec![
                PropertyName {
                    namespace: Some("urn:schemas-microsoft-com:".to_string()),
                    local_name: "Win32LastModifiedTime".to_string(),
                },
                PropertyName {
                    namespace: Some(DAV_NAMESPACE.to_string()),
                    local_name: "displayname".to_string(),
                },
            ]
        );
    }
}
