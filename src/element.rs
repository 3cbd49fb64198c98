//! Host element boundary.
//!
//! The engine scans, reads, writes and listens on a tree of UI elements; in
//! the original host this is the document tree. This module is the minimal
//! in-memory stand-in the engine is specified against: a host integration
//! mirrors real widgets into these handles (or replaces this module
//! entirely - everything the core needs is the surface below).
//!
//! Elements are shared handles (`Rc` inner), cheap to clone. All access is
//! single-threaded.

use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;

use crate::value::Value;

// =============================================================================
// Input roles
// =============================================================================

/// The role of an `input` element, parsed from its `type` attribute.
///
/// Drives which value-carrying property and which triggering event a two-way
/// or write-back binding selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputType {
    #[default]
    Text,
    Number,
    Range,
    Month,
    Week,
    Time,
    Date,
    DateTime,
    DateTimeLocal,
    Radio,
    Checkbox,
}

impl InputType {
    /// Parse the `type` attribute, case-insensitively. Unknown strings fall
    /// back to `Text`, like the host does.
    pub fn from_attr(attr: &str) -> Self {
        match attr.to_ascii_lowercase().as_str() {
            "number" => Self::Number,
            "range" => Self::Range,
            "month" => Self::Month,
            "week" => Self::Week,
            "time" => Self::Time,
            "date" => Self::Date,
            "datetime" => Self::DateTime,
            "datetime-local" => Self::DateTimeLocal,
            "radio" => Self::Radio,
            "checkbox" => Self::Checkbox,
            _ => Self::Text,
        }
    }

    /// True for the date/time family that carries `valueAsDate`.
    pub fn is_date_family(self) -> bool {
        matches!(
            self,
            Self::Month | Self::Week | Self::Time | Self::Date | Self::DateTime | Self::DateTimeLocal
        )
    }

    /// True for the checkable roles that carry `checked`.
    pub fn is_checkable(self) -> bool {
        matches!(self, Self::Radio | Self::Checkbox)
    }
}

// =============================================================================
// Events
// =============================================================================

/// A user-interaction event delivered to listeners.
#[derive(Clone)]
pub struct Event {
    /// Native event name: `input`, `change`, `click`, ...
    pub name: String,
    /// The element the event fired on.
    pub target: Element,
}

type Listener = Rc<dyn Fn(&Event)>;

// =============================================================================
// Element
// =============================================================================

struct ElementData {
    tag: String,
    input_type: InputType,
    /// Declarative binding attributes, in document order.
    binding_attrs: Vec<(String, String)>,
    /// Element properties: `value`, `textContent`, `checked`, ...
    props: IndexMap<String, Value>,
    listeners: IndexMap<String, Vec<Listener>>,
    children: Vec<Element>,
    /// Repeat prototype, `template` tags only.
    content: Option<Element>,
    /// Instances generated by a repeat binding.
    generated: Vec<Element>,
}

/// A shared handle to one UI element.
#[derive(Clone)]
pub struct Element {
    inner: Rc<RefCell<ElementData>>,
}

impl Element {
    /// Create an element. Tags are stored lowercase.
    pub fn new(tag: &str) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ElementData {
                tag: tag.to_ascii_lowercase(),
                input_type: InputType::Text,
                binding_attrs: Vec::new(),
                props: IndexMap::new(),
                listeners: IndexMap::new(),
                children: Vec::new(),
                content: None,
                generated: Vec::new(),
            })),
        }
    }

    // -------------------------------------------------------------------------
    // Builders (tree construction)
    // -------------------------------------------------------------------------

    /// Add a declarative binding attribute. Order of addition is the
    /// document order the orchestrator scans in.
    pub fn attr(self, key: &str, expression: &str) -> Self {
        self.inner
            .borrow_mut()
            .binding_attrs
            .push((key.to_string(), expression.to_string()));
        self
    }

    /// Set the input role (the `type` attribute of an `input` tag).
    pub fn input_type(self, attr: &str) -> Self {
        self.inner.borrow_mut().input_type = InputType::from_attr(attr);
        self
    }

    /// Set an initial element property.
    pub fn prop(self, name: &str, value: impl Into<Value>) -> Self {
        self.inner.borrow_mut().props.insert(name.to_string(), value.into());
        self
    }

    /// Append a child element.
    pub fn child(self, child: Element) -> Self {
        self.inner.borrow_mut().children.push(child);
        self
    }

    /// Set the repeat prototype of a `template` element.
    pub fn content(self, prototype: Element) -> Self {
        self.inner.borrow_mut().content = Some(prototype);
        self
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    pub fn tag(&self) -> String {
        self.inner.borrow().tag.clone()
    }

    pub fn input_kind(&self) -> InputType {
        self.inner.borrow().input_type
    }

    /// Declarative binding attributes in document order.
    pub fn binding_attrs(&self) -> Vec<(String, String)> {
        self.inner.borrow().binding_attrs.clone()
    }

    /// The repeat prototype, if this is a template with content.
    pub fn template_content(&self) -> Option<Element> {
        self.inner.borrow().content.clone()
    }

    /// Descendant elements in depth-first document order, EXCLUSIVE of the
    /// receiver (the scan root itself carries no bindings).
    pub fn descendants(&self) -> Vec<Element> {
        let mut out = Vec::new();
        for child in self.inner.borrow().children.iter() {
            out.push(child.clone());
            out.extend(child.descendants());
        }
        out
    }

    // -------------------------------------------------------------------------
    // Properties
    // -------------------------------------------------------------------------

    /// Read a property. Absent properties read as `Null`.
    ///
    /// Inputs expose the computed `valueAsNumber` and `valueAsDate` views of
    /// their `value` string, mirroring the host properties the role table
    /// selects.
    pub fn get(&self, property: &str) -> Value {
        let data = self.inner.borrow();
        if data.tag == "input" {
            match property {
                "valueAsNumber" => {
                    let text = data.props.get("value").map(Value::as_text).unwrap_or_default();
                    return text.trim().parse::<f64>().map(Value::Number).unwrap_or(Value::Null);
                }
                "valueAsDate" => {
                    let text = data.props.get("value").map(Value::as_text).unwrap_or_default();
                    return parse_date(text.trim()).map(Value::Number).unwrap_or(Value::Null);
                }
                _ => {}
            }
        }
        data.props.get(property).cloned().unwrap_or(Value::Null)
    }

    /// Write a property. The computed input views write back through the
    /// underlying `value` string.
    ///
    /// The host's text-carrying properties (`textContent`, `value`) coerce
    /// to text on assignment and `checked` coerces to a boolean, like the
    /// host's own property conversions; everything else stores the value
    /// as-is.
    pub fn set(&self, property: &str, value: Value) {
        let mut data = self.inner.borrow_mut();
        if data.tag == "input" {
            match property {
                "valueAsNumber" => {
                    let text = match value {
                        Value::Null => String::new(),
                        other => other.as_text(),
                    };
                    data.props.insert("value".to_string(), Value::Str(text));
                    return;
                }
                "valueAsDate" => {
                    let text = value.as_number().and_then(format_date).unwrap_or_default();
                    data.props.insert("value".to_string(), Value::Str(text));
                    return;
                }
                _ => {}
            }
        }
        let stored = match property {
            "textContent" | "value" => Value::Str(value.as_text()),
            "checked" => Value::Bool(value.is_truthy()),
            _ => value,
        };
        data.props.insert(property.to_string(), stored);
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    /// Subscribe to a native event by name.
    pub fn on(&self, event_name: &str, listener: impl Fn(&Event) + 'static) {
        self.inner
            .borrow_mut()
            .listeners
            .entry(event_name.to_string())
            .or_default()
            .push(Rc::new(listener));
    }

    /// Fire an event on this element, invoking listeners synchronously in
    /// subscription order. Listeners may read and write this element's
    /// properties re-entrantly.
    pub fn dispatch(&self, event_name: &str) {
        let listeners: Vec<Listener> = self
            .inner
            .borrow()
            .listeners
            .get(event_name)
            .cloned()
            .unwrap_or_default();
        let event = Event { name: event_name.to_string(), target: self.clone() };
        for listener in listeners {
            listener(&event);
        }
    }

    // -------------------------------------------------------------------------
    // Repeat instances
    // -------------------------------------------------------------------------

    /// Instances generated by a repeat binding on this template.
    pub fn generated_instances(&self) -> Vec<Element> {
        self.inner.borrow().generated.clone()
    }

    pub(crate) fn clear_generated(&self) {
        self.inner.borrow_mut().generated.clear();
    }

    pub(crate) fn push_generated(&self, instance: Element) {
        self.inner.borrow_mut().generated.push(instance);
    }

    /// Structural copy used to instantiate a template prototype. Listeners
    /// are not copied; binding attributes and properties are.
    pub(crate) fn clone_deep(&self) -> Element {
        let data = self.inner.borrow();
        let copy = Element::new(&data.tag);
        {
            let mut inner = copy.inner.borrow_mut();
            inner.input_type = data.input_type;
            inner.binding_attrs = data.binding_attrs.clone();
            inner.props = data.props.clone();
        }
        for child in data.children.iter() {
            copy.inner.borrow_mut().children.push(child.clone_deep());
        }
        copy
    }
}

// =============================================================================
// Date conversion
// =============================================================================

/// The host's representable date range: 100 million days either side of
/// the epoch. Anything outside is an invalid date and reads/writes as null.
const MAX_EPOCH_MS: f64 = 8.64e15;
const MIN_YEAR: i64 = -271_821;
const MAX_YEAR: i64 = 275_760;

/// Parse `YYYY-MM-DD` into epoch milliseconds at UTC midnight. Out-of-range
/// dates are invalid, not panics.
fn parse_date(text: &str) -> Option<f64> {
    let mut parts = text.splitn(3, '-');
    let year: i64 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let day: u32 = parts.next()?.parse().ok()?;
    if !(MIN_YEAR..=MAX_YEAR).contains(&year)
        || !(1..=12).contains(&month)
        || !(1..=31).contains(&day)
    {
        return None;
    }
    let ms = days_from_civil(year, month, day) as f64 * 86_400_000.0;
    (ms.abs() <= MAX_EPOCH_MS).then_some(ms)
}

/// Format epoch milliseconds back to `YYYY-MM-DD` (UTC). Sub-day precision
/// is truncated; out-of-range instants are invalid dates.
fn format_date(epoch_ms: f64) -> Option<String> {
    if !epoch_ms.is_finite() || epoch_ms.abs() > MAX_EPOCH_MS {
        return None;
    }
    let days = (epoch_ms / 86_400_000.0).floor() as i64;
    let (year, month, day) = civil_from_days(days);
    Some(format!("{year:04}-{month:02}-{day:02}"))
}

/// Days since 1970-01-01 for a proleptic Gregorian civil date.
fn days_from_civil(year: i64, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = (y - era * 400) as u64;
    let m = month as u64;
    let doy = (153 * (if m > 2 { m - 3 } else { m + 9 }) + 2) / 5 + day as u64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe as i64 - 719_468
}

/// Inverse of [`days_from_civil`].
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    (if month <= 2 { y + 1 } else { y }, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_input_type_parsing() {
        assert_eq!(InputType::from_attr("NUMBER"), InputType::Number);
        assert_eq!(InputType::from_attr("datetime-local"), InputType::DateTimeLocal);
        assert_eq!(InputType::from_attr("mystery"), InputType::Text);
        assert!(InputType::Checkbox.is_checkable());
        assert!(InputType::Week.is_date_family());
    }

    #[test]
    fn test_props_default_null() {
        let elem = Element::new("div");
        assert_eq!(elem.get("textContent"), Value::Null);
        elem.set("textContent", Value::from("hi"));
        assert_eq!(elem.get("textContent"), Value::from("hi"));
    }

    #[test]
    fn test_value_as_number() {
        let elem = Element::new("input").input_type("number").prop("value", "42");
        assert_eq!(elem.get("valueAsNumber"), Value::Number(42.0));

        elem.set("value", Value::from("not a number"));
        assert_eq!(elem.get("valueAsNumber"), Value::Null);

        elem.set("valueAsNumber", Value::Number(7.0));
        assert_eq!(elem.get("value"), Value::from("7"));
    }

    #[test]
    fn test_value_as_date_round_trip() {
        let elem = Element::new("input").input_type("date").prop("value", "1970-01-02");
        assert_eq!(elem.get("valueAsDate"), Value::Number(86_400_000.0));

        elem.set("valueAsDate", Value::Number(0.0));
        assert_eq!(elem.get("value"), Value::from("1970-01-01"));

        elem.set("value", Value::from("2024-02-29"));
        let ms = elem.get("valueAsDate").as_number().unwrap();
        elem.set("valueAsDate", Value::Number(ms));
        assert_eq!(elem.get("value"), Value::from("2024-02-29"));
    }

    #[test]
    fn test_out_of_range_dates_are_invalid() {
        let elem = Element::new("input").input_type("date");

        // A year beyond the representable range reads as null.
        elem.set("value", Value::from("92233720368547758-01-01"));
        assert_eq!(elem.get("valueAsDate"), Value::Null);

        // An instant beyond the representable range writes an empty value.
        elem.set("valueAsDate", Value::Number(1e300));
        assert_eq!(elem.get("value"), Value::from(""));
        elem.set("valueAsDate", Value::Number(-1e300));
        assert_eq!(elem.get("value"), Value::from(""));

        // The boundary itself is still a valid date.
        elem.set("valueAsDate", Value::Number(8.64e15));
        assert_eq!(elem.get("value"), Value::from("275760-09-13"));
    }

    #[test]
    fn test_dispatch_order_and_target() {
        let elem = Element::new("button");
        let log = Rc::new(RefCell::new(Vec::new()));

        let first = Rc::clone(&log);
        elem.on("click", move |event| {
            first.borrow_mut().push(format!("first:{}", event.name));
        });
        let second = Rc::clone(&log);
        elem.on("click", move |event| {
            second.borrow_mut().push(format!("second:{}", event.target.tag()));
        });

        elem.dispatch("click");
        assert_eq!(*log.borrow(), vec!["first:click", "second:button"]);

        // Unknown events are a no-op.
        elem.dispatch("keydown");
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn test_listener_can_write_target() {
        let elem = Element::new("input");
        let hits = Rc::new(Cell::new(0));
        let hits_clone = Rc::clone(&hits);
        elem.on("input", move |event| {
            event.target.set("seen", Value::Bool(true));
            hits_clone.set(hits_clone.get() + 1);
        });
        elem.dispatch("input");
        assert_eq!(hits.get(), 1);
        assert_eq!(elem.get("seen"), Value::Bool(true));
    }

    #[test]
    fn test_descendants_exclusive_preorder() {
        let leaf = Element::new("span");
        let mid = Element::new("p").child(leaf);
        let root = Element::new("div").child(mid).child(Element::new("em"));

        let tags: Vec<String> = root.descendants().iter().map(Element::tag).collect();
        assert_eq!(tags, vec!["p", "span", "em"]);
    }

    #[test]
    fn test_clone_deep_is_independent() {
        let proto = Element::new("li").attr("bind", "this.x").prop("textContent", "seed");
        let copy = proto.clone_deep();
        copy.set("textContent", Value::from("changed"));
        assert_eq!(proto.get("textContent"), Value::from("seed"));
        assert_eq!(copy.binding_attrs(), proto.binding_attrs());
    }

    #[test]
    fn test_civil_date_math() {
        assert_eq!(days_from_civil(1970, 1, 1), 0);
        assert_eq!(days_from_civil(2000, 3, 1), 11_017);
        for days in [-719_468, -1, 0, 1, 11_017, 20_000] {
            let (y, m, d) = civil_from_days(days);
            assert_eq!(days_from_civil(y, m, d), days);
        }
    }
}
