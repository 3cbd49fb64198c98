//! Binding orchestrator.
//!
//! Walks the element tree once at startup, classifies each declarative
//! attribute into a binding kind, and wires it to the expression compiler,
//! dependency extractor, binding registry and reactive store.
//!
//! Per-binding lifecycle: created here, then active for the lifetime of the
//! element/view-model pair. There is no unbind API; removing an element from
//! the host tree leaves a dangling-but-harmless registry entry.

use std::rc::Rc;

use crate::deps::extract_paths;
use crate::element::{Element, Event, InputType};
use crate::error::BindError;
use crate::expr::{EvalContext, Expression, Role};
use crate::registry::{BindingAction, BindingRegistry};
use crate::store::ViewModel;
use crate::value::Value;

/// Bind entry point.
///
/// Wraps `view_model` reactively (a list root fails here, before any element
/// is scanned), then scans the descendants of `root` - exclusive of `root`
/// itself - for declarative binding attributes and installs every binding.
/// Returns the reactive wrapper, the single source of truth thereafter.
///
/// Authoring, structural and conflict errors abort the whole pass; runtime
/// evaluation errors during the initial pass are absorbed like any later
/// ones.
pub fn bootstrap(root: &Element, view_model: Value) -> Result<ViewModel, BindError> {
    let registry = Rc::new(BindingRegistry::new());
    let vm = ViewModel::new(view_model, registry)?;

    for element in root.descendants() {
        install_element(&element, &vm)?;
    }

    Ok(vm)
}

/// Process one element's binding attributes in document order.
fn install_element(element: &Element, vm: &ViewModel) -> Result<(), BindError> {
    // Target properties already claimed by a model→element-writing directive
    // on this element. A second claim is a conflict.
    let mut claimed: Vec<String> = Vec::new();

    for (key, text) in element.binding_attrs() {
        if key.eq_ignore_ascii_case("init") {
            install_init(vm, &text)?;
        } else if key.eq_ignore_ascii_case("source") {
            let (property, event_name) = select_role(element);
            install_write_back(element, vm, &text, property, event_name, false)?;
        } else if key.eq_ignore_ascii_case("model") {
            let (property, event_name) = select_role(element);
            claim(&mut claimed, property)?;
            // Element-to-model first: the element's current value seeds the
            // view-model field before any user interaction.
            install_write_back(element, vm, &text, property, event_name, true)?;
            install_one_way(element, vm, property, &text)?;
        } else if key.eq_ignore_ascii_case("repeat") && element.tag() == "template" {
            install_repeat(element, vm, &text)?;
        } else if is_event_key(&key) {
            let event_name = key[2..].to_ascii_lowercase();
            install_event(element, vm, &event_name, &text)?;
        } else if key.eq_ignore_ascii_case("bind") {
            claim(&mut claimed, "textContent")?;
            install_one_way(element, vm, "textContent", &text)?;
        } else {
            claim(&mut claimed, &key)?;
            install_one_way(element, vm, &key, &text)?;
        }
    }

    Ok(())
}

/// `on<Event>` convention: `on` followed by an uppercase letter.
fn is_event_key(key: &str) -> bool {
    key.len() > 2 && key.starts_with("on") && key.as_bytes()[2].is_ascii_uppercase()
}

fn claim(claimed: &mut Vec<String>, property: &str) -> Result<(), BindError> {
    if claimed.iter().any(|p| p == property) {
        return Err(BindError::Conflict { property: property.to_string() });
    }
    claimed.push(property.to_string());
    Ok(())
}

/// Property/event pair a write-back binding uses, selected by element role.
fn select_role(element: &Element) -> (&'static str, &'static str) {
    if element.tag() != "input" {
        return ("value", "input");
    }
    let kind = element.input_kind();
    if matches!(kind, InputType::Number | InputType::Range) {
        ("valueAsNumber", "input")
    } else if kind.is_date_family() {
        ("valueAsDate", "input")
    } else if kind.is_checkable() {
        ("checked", "change")
    } else {
        ("value", "input")
    }
}

/// Report an absorbed evaluation failure.
fn report(text: &str, err: &BindError) {
    if err.is_recoverable() {
        tracing::warn!(expression = text, error = %err, "binding expression failed");
    } else {
        tracing::error!(expression = text, error = %err, "binding aborted");
    }
}

/// Initializer: run once as a statement at bind time, no tracking.
fn install_init(vm: &ViewModel, text: &str) -> Result<(), BindError> {
    let expr = Expression::compile(text, Role::Statement)?;
    if let Err(err) = expr.eval(&EvalContext::of(vm)) {
        report(text, &err);
    }
    Ok(())
}

/// One-way binding: evaluate immediately, assign to the target property,
/// then register under every extracted dependency path.
fn install_one_way(
    element: &Element,
    vm: &ViewModel,
    property: &str,
    text: &str,
) -> Result<(), BindError> {
    let expr = Expression::compile(text, Role::Value)?;

    let action: BindingAction = {
        let element = element.clone();
        let property = property.to_string();
        let text = text.to_string();
        Rc::new(move |vm: &ViewModel| match expr.eval(&EvalContext::of(vm)) {
            Ok(value) => element.set(&property, value),
            Err(err) => {
                report(&text, &err);
                element.set(&property, Value::Str(String::new()));
            }
        })
    };

    action(vm);

    for path in extract_paths(text) {
        vm.registry().register(&path, Rc::clone(&action));
    }
    Ok(())
}

/// Write-back binding: listen for the role-selected event and assign the
/// event target's value-carrying property into the view-model.
///
/// The statement is composed textually, exactly like the one-way direction's
/// expressions: `<expr> = $event.target.<property>`. With `seed`, it runs
/// once with a synthetic event so the element's current value initializes
/// the view-model field.
fn install_write_back(
    element: &Element,
    vm: &ViewModel,
    text: &str,
    property: &str,
    event_name: &str,
    seed: bool,
) -> Result<(), BindError> {
    let statement = format!("{text} = $event.target.{property}");
    let expr = Expression::compile(&statement, Role::Event)?;

    if seed {
        let event = Event { name: event_name.to_string(), target: element.clone() };
        if let Err(err) = expr.eval(&EvalContext::with_event(vm, &event)) {
            report(&statement, &err);
        }
    }

    let vm = vm.clone();
    element.on(event_name, move |event| {
        if let Err(err) = expr.eval(&EvalContext::with_event(&vm, event)) {
            report(expr.text(), &err);
        }
    });
    Ok(())
}

/// Event binding: `on<Event>` attribute, expression compiled as a statement
/// taking the event.
fn install_event(
    element: &Element,
    vm: &ViewModel,
    event_name: &str,
    text: &str,
) -> Result<(), BindError> {
    let expr = Expression::compile(text, Role::Event)?;
    let vm = vm.clone();
    element.on(event_name, move |event| {
        if let Err(err) = expr.eval(&EvalContext::with_event(&vm, event)) {
            report(expr.text(), &err);
        }
    });
    Ok(())
}

/// Repeat binding on a template element: re-evaluates a sequence-producing
/// expression on dependency change and regenerates instances from the
/// template prototype.
///
/// Deliberately incomplete extension point: only non-null scalar items are
/// supported; object and list items are rejected with a structural error -
/// fatal on the bind-time pass, logged and aborted on later re-evaluations
/// (a structural error cannot cross the notify boundary).
fn install_repeat(element: &Element, vm: &ViewModel, text: &str) -> Result<(), BindError> {
    let expr = Expression::compile(text, Role::Value)?;
    let prototype = element.template_content().ok_or_else(|| {
        BindError::UnsupportedStructure("repeat template has no content".to_string())
    })?;

    let run = {
        let template = element.clone();
        let text = text.to_string();
        move |vm: &ViewModel| -> Result<(), BindError> {
            let value = expr.eval(&EvalContext::of(vm))?;
            let Value::List(items) = value else {
                return Err(BindError::evaluation(
                    &text,
                    format!("repeat expression must produce a sequence, got {}", value.type_name()),
                ));
            };
            instantiate_items(&template, &prototype, items)
        }
    };

    // Bind-time pass: structural errors abort setup, evaluation errors are
    // absorbed like anywhere else.
    match run(vm) {
        Err(err @ BindError::UnsupportedStructure(_)) => return Err(err),
        Err(err) => report(text, &err),
        Ok(()) => {}
    }

    let action: BindingAction = {
        let text = text.to_string();
        Rc::new(move |vm: &ViewModel| {
            if let Err(err) = run(vm) {
                report(&text, &err);
            }
        })
    };
    for path in extract_paths(text) {
        vm.registry().register(&path, Rc::clone(&action));
    }
    Ok(())
}

/// Regenerate a template's instances from `items`. Null items are skipped;
/// object and list items are rejected; scalars clone the prototype with
/// their text as content.
fn instantiate_items(
    template: &Element,
    prototype: &Element,
    items: Vec<Value>,
) -> Result<(), BindError> {
    template.clear_generated();
    for item in items {
        match item {
            Value::Null => continue,
            Value::Object(_) | Value::List(_) => {
                return Err(BindError::UnsupportedStructure(format!(
                    "repeat items must be non-null scalars, got {}",
                    item.type_name()
                )));
            }
            scalar => {
                let instance = prototype.clone_deep();
                instance.set("textContent", Value::Str(scalar.as_text()));
                template.push_generated(instance);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_key_convention() {
        assert!(is_event_key("onClick"));
        assert!(is_event_key("onDblclick"));
        assert!(!is_event_key("on"));
        assert!(!is_event_key("online"));
        assert!(!is_event_key("bind"));
    }

    #[test]
    fn test_role_selection() {
        let number = Element::new("input").input_type("number");
        assert_eq!(select_role(&number), ("valueAsNumber", "input"));

        let date = Element::new("input").input_type("date");
        assert_eq!(select_role(&date), ("valueAsDate", "input"));

        let checkbox = Element::new("input").input_type("checkbox");
        assert_eq!(select_role(&checkbox), ("checked", "change"));

        let text = Element::new("input");
        assert_eq!(select_role(&text), ("value", "input"));

        let select = Element::new("select");
        assert_eq!(select_role(&select), ("value", "input"));
    }

    #[test]
    fn test_claim_conflict() {
        let mut claimed = Vec::new();
        claim(&mut claimed, "textContent").unwrap();
        claim(&mut claimed, "value").unwrap();
        let err = claim(&mut claimed, "textContent").unwrap_err();
        assert!(matches!(err, BindError::Conflict { property } if property == "textContent"));
    }

    #[test]
    fn test_instantiate_scalar_items() {
        let template = Element::new("template");
        let prototype = Element::new("li");

        instantiate_items(
            &template,
            &prototype,
            vec![
                Value::from("a"),
                Value::Null,
                Value::Number(2.0),
                Value::Bool(true),
            ],
        )
        .unwrap();

        let texts: Vec<Value> = template
            .generated_instances()
            .iter()
            .map(|el| el.get("textContent"))
            .collect();
        // Null items are skipped, scalars are stringified.
        assert_eq!(
            texts,
            vec![Value::from("a"), Value::from("2"), Value::from("true")]
        );
    }

    #[test]
    fn test_instantiate_rejects_object_items() {
        let template = Element::new("template");
        let prototype = Element::new("li");

        let err = instantiate_items(&template, &prototype, vec![Value::object()]).unwrap_err();
        assert!(matches!(err, BindError::UnsupportedStructure(_)));

        let err = instantiate_items(&template, &prototype, vec![Value::List(vec![])]).unwrap_err();
        assert!(matches!(err, BindError::UnsupportedStructure(_)));
    }

    #[test]
    fn test_instantiate_clears_previous_generation() {
        let template = Element::new("template");
        let prototype = Element::new("li");

        instantiate_items(&template, &prototype, vec![Value::from("a"), Value::from("b")]).unwrap();
        assert_eq!(template.generated_instances().len(), 2);

        instantiate_items(&template, &prototype, vec![Value::from("c")]).unwrap();
        assert_eq!(template.generated_instances().len(), 1);
    }
}
