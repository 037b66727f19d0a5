//! `<ionmodification/>` elements.
//!
//! One element per single modification; combined modifications are written
//! as one element per member and loaded back with [`load_all_from_xml`].

use std::fmt::Write;

use roxmltree::{
    Document,
    Node,
};

use crate::errors::{
    IonNetError,
    XmlError,
};
use crate::models::modification::{
    IonModification,
    ModificationKind,
};

pub const XML_ELEMENT: &str = "ionmodification";
/// Written for absent formulas.
pub const XML_NULL_VALUE: &str = "N/A";

fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// Serializes every member of `modification` as its own element.
///
/// ```
/// use ionnet::io::modification_xml::{from_xml_str, to_xml};
/// use ionnet::models::defaults;
///
/// let xml = to_xml(&defaults::h2o());
/// assert!(xml.contains(r#"formula="H2O""#));
/// assert_eq!(from_xml_str(&xml).unwrap(), defaults::h2o());
/// ```
pub fn to_xml(modification: &IonModification) -> String {
    let mut out = String::new();
    for m in modification.modifications() {
        // Writing into a String cannot fail.
        let _ = writeln!(
            out,
            r#"<{} name="{}" formula="{}" massdifference="{}" type="{}" charge="{}"/>"#,
            XML_ELEMENT,
            escape_attribute(m.name()),
            escape_attribute(m.formula().unwrap_or(XML_NULL_VALUE)),
            m.mass(),
            m.kind().as_str(),
            m.charge(),
        );
    }
    out
}

fn required<'a>(node: &Node<'a, '_>, attribute: &'static str) -> Result<&'a str, XmlError> {
    node.attribute(attribute)
        .ok_or(XmlError::MissingAttribute {
            element: XML_ELEMENT,
            attribute,
        })
}

/// Reads one single modification. Any other element is an error.
pub fn from_xml_element(node: &Node) -> Result<IonModification, XmlError> {
    if !node.has_tag_name(XML_ELEMENT) {
        return Err(XmlError::UnexpectedElement {
            expected: XML_ELEMENT,
            found: node.tag_name().name().to_string(),
        });
    }
    let name = required(node, "name")?;
    let formula = node
        .attribute("formula")
        .filter(|f| *f != XML_NULL_VALUE && !f.is_empty());
    let mass_str = required(node, "massdifference")?;
    let mass: f64 = mass_str.parse().map_err(|_| XmlError::InvalidAttribute {
        attribute: "massdifference",
        value: mass_str.to_string(),
    })?;
    let kind_str = required(node, "type")?;
    let kind: ModificationKind = kind_str.parse().map_err(|_| XmlError::InvalidAttribute {
        attribute: "type",
        value: kind_str.to_string(),
    })?;
    let charge_str = required(node, "charge")?;
    let charge: i32 = charge_str.parse().map_err(|_| XmlError::InvalidAttribute {
        attribute: "charge",
        value: charge_str.to_string(),
    })?;
    Ok(IonModification::new(kind, name, formula, mass, charge))
}

/// Reads a document whose root is a single `<ionmodification/>`.
pub fn from_xml_str(xml: &str) -> Result<IonModification, IonNetError> {
    let document = Document::parse(xml)?;
    Ok(from_xml_element(&document.root_element())?)
}

/// Reads a sequence of sibling elements, as written by [`to_xml`] for a
/// combined modification, and combines them.
pub fn load_all_from_xml(xml: &str) -> Result<IonModification, IonNetError> {
    let wrapped = format!("<ionmodifications>{}</ionmodifications>", xml);
    let document = Document::parse(&wrapped)?;
    let members = document
        .root_element()
        .children()
        .filter(|n| n.is_element())
        .map(|n| from_xml_element(&n))
        .collect::<Result<Vec<_>, _>>()?;
    if members.is_empty() {
        return Err(XmlError::UnexpectedElement {
            expected: XML_ELEMENT,
            found: String::new(),
        }
        .into());
    }
    Ok(IonModification::create(&members))
}
