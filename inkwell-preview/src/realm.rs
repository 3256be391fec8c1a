//! Headless preflight: evaluates component code in a fresh boa realm.
//!
//! The code goes through the same neutralization as the browser path, then
//! JSX is lowered and the result runs against a small React shim on a
//! worker thread. The entry component is resolved with the browser rules
//! and rendered once to a plain element tree. Effects never run and state
//! setters are no-ops, so this checks that the component evaluates and
//! renders, not how it behaves.

use crate::boundary::{BoundaryId, BoundaryPhase, BoundaryReport};
use crate::document::{diagnostic_document, runner_suffix, MISSING_ENTRY_MESSAGE, RUNNER_PREFIX};
use crate::error::{PreviewError, PreviewResult};
use crate::jsx::{lower_jsx, strip_type_declarations};
use crate::modules::{neutralize, Neutralized};
use crate::sanitize::{harden, sanitize};
use boa_engine::{Context, Source};
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Loop iterations before boa aborts the script. Bounds how long an
/// abandoned realm thread can keep running.
const LOOP_ITERATION_LIMIT: u64 = 5_000_000;
const RECURSION_LIMIT: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MountedNode {
    Text {
        text: String,
    },
    Element {
        tag: String,
        #[serde(rename = "className", default, skip_serializing_if = "Option::is_none")]
        class_name: Option<String>,
        #[serde(default)]
        children: Vec<MountedNode>,
    },
}

impl MountedNode {
    /// This node plus all of its descendants.
    pub fn count(&self) -> usize {
        match self {
            MountedNode::Text { .. } => 1,
            MountedNode::Element { children, .. } => {
                1 + children.iter().map(MountedNode::count).sum::<usize>()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PreflightOutcome {
    Mounted {
        entry: String,
        elements: Vec<MountedNode>,
    },
    CompileError {
        message: String,
    },
    RuntimeError {
        phase: BoundaryPhase,
        message: String,
    },
    MissingEntry {
        message: String,
    },
    TimedOut {
        after_ms: u64,
    },
}

impl PreflightOutcome {
    pub fn is_mounted(&self) -> bool {
        matches!(self, PreflightOutcome::Mounted { .. })
    }

    pub fn phase(&self) -> Option<BoundaryPhase> {
        match self {
            PreflightOutcome::Mounted { .. } => None,
            PreflightOutcome::CompileError { .. } => Some(BoundaryPhase::Compile),
            PreflightOutcome::RuntimeError { phase, .. } => Some(*phase),
            PreflightOutcome::MissingEntry { .. } => Some(BoundaryPhase::Entry),
            PreflightOutcome::TimedOut { .. } => Some(BoundaryPhase::Module),
        }
    }

    pub fn message(&self) -> Option<String> {
        match self {
            PreflightOutcome::Mounted { .. } => None,
            PreflightOutcome::CompileError { message }
            | PreflightOutcome::RuntimeError { message, .. }
            | PreflightOutcome::MissingEntry { message } => Some(message.clone()),
            PreflightOutcome::TimedOut { after_ms } => {
                Some(format!("Evaluation timed out after {after_ms} ms"))
            }
        }
    }

    /// The report a boundary would post for this outcome.
    pub fn report(&self, boundary: BoundaryId) -> Option<BoundaryReport> {
        Some(BoundaryReport {
            boundary,
            phase: self.phase()?,
            message: self.message()?,
        })
    }

    /// Static document with the failure in the error banner.
    pub fn diagnostic_document(&self) -> Option<String> {
        self.message().map(|m| diagnostic_document(&m))
    }
}

/// Sanitizes, neutralizes and evaluates raw component code.
pub fn preflight(code: &str, timeout: Duration) -> PreviewResult<PreflightOutcome> {
    let neutralized = neutralize(&harden(&sanitize(code)));
    preflight_neutralized(&neutralized, timeout)
}

pub fn preflight_neutralized(
    code: &Neutralized,
    timeout: Duration,
) -> PreviewResult<PreflightOutcome> {
    let stripped = strip_type_declarations(&code.code);
    let lowered = match lower_jsx(&stripped) {
        Ok(js) => js,
        Err(e) => {
            return Ok(PreflightOutcome::CompileError {
                message: e.to_string(),
            })
        }
    };

    let script = realm_script(&lowered, &code.candidates);
    let after_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
    let outcome = match run_script(script, timeout)? {
        RealmRun::Finished(json) => serde_json::from_str(&json)?,
        RealmRun::Threw(message) => PreflightOutcome::RuntimeError {
            phase: BoundaryPhase::Module,
            message,
        },
        RealmRun::TimedOut => PreflightOutcome::TimedOut { after_ms },
    };

    Ok(match outcome {
        PreflightOutcome::RuntimeError { message, .. } if hit_loop_limit(&message) => {
            PreflightOutcome::TimedOut { after_ms }
        }
        other => other,
    })
}

fn hit_loop_limit(message: &str) -> bool {
    message.contains("loop iteration limit")
}

enum RealmRun {
    Finished(String),
    Threw(String),
    TimedOut,
}

fn run_script(script: String, timeout: Duration) -> PreviewResult<RealmRun> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("inkwell-realm".to_string())
        .spawn(move || {
            let mut context = Context::default();
            context
                .runtime_limits_mut()
                .set_loop_iteration_limit(LOOP_ITERATION_LIMIT);
            context.runtime_limits_mut().set_recursion_limit(RECURSION_LIMIT);

            let run = match context.eval(Source::from_bytes(&script)) {
                Ok(value) => match value.to_string(&mut context) {
                    Ok(s) => RealmRun::Finished(s.to_std_string_escaped()),
                    Err(e) => RealmRun::Threw(e.to_string()),
                },
                Err(e) => RealmRun::Threw(e.to_string()),
            };
            // The receiver is gone when the host already gave up on us.
            let _ = tx.send(run);
        })?;

    match rx.recv_timeout(timeout) {
        Ok(run) => Ok(run),
        Err(RecvTimeoutError::Timeout) => {
            tracing::warn!(timeout_ms = timeout.as_millis() as u64, "preflight realm abandoned");
            Ok(RealmRun::TimedOut)
        }
        Err(RecvTimeoutError::Disconnected) => Err(PreviewError::Realm(
            "realm thread exited without a result".to_string(),
        )),
    }
}

fn realm_script(lowered: &str, candidates: &[String]) -> String {
    let runner = format!("{RUNNER_PREFIX}{lowered}{}", runner_suffix(candidates));
    let evaluate = EVALUATE_JS
        .replace(
            "__MISSING_ENTRY__",
            &serde_json::Value::from(MISSING_ENTRY_MESSAGE).to_string(),
        )
        .replace("__RUNNER__", &serde_json::Value::from(runner).to_string());
    format!("{PRELUDE_JS}\n{evaluate}")
}

const PRELUDE_JS: &str = r#"var window = globalThis;
var __inkwellConsoleErrors = [];
function __inkwellMessage(err) {
  if (err && typeof err === 'object' && 'message' in err) {
    return (err.name ? err.name + ': ' : '') + err.message;
  }
  return String(err);
}
var console = {
  log: function () {},
  info: function () {},
  warn: function () {},
  debug: function () {},
  error: function () {
    __inkwellConsoleErrors.push(Array.prototype.slice.call(arguments).map(String).join(' '));
  }
};
var document = {
  body: {},
  getElementById: function () { return {}; },
  querySelector: function () { return null; },
  createElement: function () { return {}; },
  addEventListener: function () {},
  removeEventListener: function () {}
};
var localStorage = {
  getItem: function () { return null; },
  setItem: function () {},
  removeItem: function () {}
};
function setTimeout() { return 0; }
function setInterval() { return 0; }
function clearTimeout() {}
function clearInterval() {}
function requestAnimationFrame() { return 0; }
function fetch() { return new Promise(function () {}); }

var React = (function () {
  var ELEMENT = 'inkwell.element';
  var Fragment = { fragment: true };
  function createElement(type, props) {
    var children = Array.prototype.slice.call(arguments, 2);
    return { $$typeof: ELEMENT, type: type, props: props || {}, children: children };
  }
  function toArray(children) {
    return [].concat(children === undefined || children === null ? [] : children);
  }
  function Component(props) {
    this.props = props;
    this.state = {};
  }
  Component.prototype.isReactComponent = {};
  Component.prototype.setState = function (update) {
    var next = typeof update === 'function' ? update(this.state, this.props) : update;
    this.state = Object.assign({}, this.state, next);
  };
  Component.prototype.forceUpdate = function () {};
  function createContext(value) {
    var context = { _value: value };
    context.Provider = function (props) {
      context._value = props.value;
      return props.children;
    };
    context.Consumer = function (props) {
      return props.children(context._value);
    };
    return context;
  }
  return {
    createElement: createElement,
    Fragment: Fragment,
    StrictMode: Fragment,
    Suspense: Fragment,
    Component: Component,
    PureComponent: Component,
    createContext: createContext,
    useState: function (initial) {
      return [typeof initial === 'function' ? initial() : initial, function () {}];
    },
    useReducer: function (reducer, initial, init) {
      return [init ? init(initial) : initial, function () {}];
    },
    useEffect: function () {},
    useLayoutEffect: function () {},
    useInsertionEffect: function () {},
    useImperativeHandle: function () {},
    useMemo: function (factory) { return factory(); },
    useCallback: function (fn) { return fn; },
    useRef: function (initial) { return { current: initial === undefined ? null : initial }; },
    useContext: function (context) { return context ? context._value : undefined; },
    useId: function () { return ':inkwell:'; },
    useTransition: function () { return [false, function (fn) { fn(); }]; },
    useDeferredValue: function (value) { return value; },
    memo: function (component) { return component; },
    forwardRef: function (render) {
      return function (props) { return render(props, null); };
    },
    lazy: function () { return function () { return null; }; },
    isValidElement: function (value) { return !!value && value.$$typeof === ELEMENT; },
    cloneElement: function (element, props) {
      var extra = Array.prototype.slice.call(arguments, 2);
      return {
        $$typeof: ELEMENT,
        type: element.type,
        props: Object.assign({}, element.props, props),
        children: extra.length ? extra : element.children
      };
    },
    Children: {
      toArray: toArray,
      map: function (children, fn) { return toArray(children).map(fn); },
      forEach: function (children, fn) { toArray(children).forEach(fn); },
      count: function (children) { return toArray(children).length; },
      only: function (children) { return toArray(children)[0]; }
    }
  };
})();

var ReactDOM = {
  createRoot: function () {
    return { render: function () {}, unmount: function () {} };
  },
  render: function () {},
  createPortal: function (children) { return children; }
};

function __inkwellRender(node, depth) {
  if (depth > 256) {
    throw new Error('Component tree is too deep');
  }
  if (node === null || node === undefined || typeof node === 'boolean') {
    return [];
  }
  if (typeof node === 'string' || typeof node === 'number') {
    return [{ text: String(node) }];
  }
  if (Array.isArray(node)) {
    var out = [];
    for (var i = 0; i < node.length; i++) {
      out = out.concat(__inkwellRender(node[i], depth + 1));
    }
    return out;
  }
  if (node.$$typeof !== 'inkwell.element') {
    throw new Error('Objects are not valid as a React child (found: ' + Object.prototype.toString.call(node) + ')');
  }
  var type = node.type;
  var props = Object.assign({}, node.props);
  if (node.children.length) {
    props.children = node.children.length === 1 ? node.children[0] : node.children;
  }
  if (type === React.Fragment) {
    return __inkwellRender(node.children, depth + 1);
  }
  if (typeof type === 'function') {
    if (type.prototype && type.prototype.isReactComponent) {
      var instance = new type(props);
      instance.props = props;
      return __inkwellRender(instance.render(), depth + 1);
    }
    return __inkwellRender(type(props), depth + 1);
  }
  if (typeof type === 'string') {
    var element = { tag: type, children: __inkwellRender(node.children, depth + 1) };
    if (typeof props.className === 'string') {
      element.className = props.className;
    }
    return [element];
  }
  throw new Error('Element type is invalid: expected a string or a function but got: ' + (type === null ? 'null' : typeof type));
}
"#;

const EVALUATE_JS: &str = r#"var __inkwellOutcome = (function () {
  window.App = undefined;
  var factory;
  try {
    factory = new Function('React', 'ReactDOM', __RUNNER__);
  } catch (err) {
    return { outcome: 'compile_error', message: __inkwellMessage(err) };
  }
  try {
    factory(React, ReactDOM);
  } catch (err) {
    return { outcome: 'runtime_error', phase: 'module', message: __inkwellMessage(err) };
  }
  if (__inkwellConsoleErrors.length) {
    return { outcome: 'runtime_error', phase: 'console', message: __inkwellConsoleErrors[0] };
  }
  var entry = window.App;
  if (!entry) {
    return { outcome: 'missing_entry', message: __MISSING_ENTRY__ };
  }
  var elements;
  try {
    elements = __inkwellRender(React.createElement(entry), 0);
  } catch (err) {
    return { outcome: 'runtime_error', phase: 'render', message: __inkwellMessage(err) };
  }
  if (__inkwellConsoleErrors.length) {
    return { outcome: 'runtime_error', phase: 'console', message: __inkwellConsoleErrors[0] };
  }
  return { outcome: 'mounted', entry: entry.name || 'App', elements: elements };
})();
JSON.stringify(__inkwellOutcome);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(20);

    #[test]
    fn mounts_component_with_hooks() {
        let code = r#"
import React, { useState } from 'react';

export default function App() {
  const [count] = useState(2);
  return <main className="p-4"><h1>Count {count}</h1><Button label="Go" /></main>;
}

function Button({ label }) {
  return <button>{label}</button>;
}
"#;
        let outcome = preflight(code, TIMEOUT).unwrap();
        let (entry, elements) = match outcome {
            PreflightOutcome::Mounted { entry, elements } => (entry, elements),
            other => panic!("expected mount, got {other:?}"),
        };
        assert_eq!(entry, "App");
        assert_eq!(
            elements,
            vec![MountedNode::Element {
                tag: "main".into(),
                class_name: Some("p-4".into()),
                children: vec![
                    MountedNode::Element {
                        tag: "h1".into(),
                        class_name: None,
                        children: vec![
                            MountedNode::Text { text: "Count ".into() },
                            MountedNode::Text { text: "2".into() },
                        ],
                    },
                    MountedNode::Element {
                        tag: "button".into(),
                        class_name: None,
                        children: vec![MountedNode::Text { text: "Go".into() }],
                    },
                ],
            }]
        );
    }

    #[test]
    fn falls_back_to_first_candidate() {
        let outcome = preflight("const Landing = () => <p>hi</p>;", TIMEOUT).unwrap();
        assert!(matches!(outcome, PreflightOutcome::Mounted { ref entry, .. } if entry == "Landing"));
    }

    #[test]
    fn module_throw_is_a_runtime_error() {
        let outcome = preflight("throw new Error('boom');", TIMEOUT).unwrap();
        assert_eq!(outcome.phase(), Some(BoundaryPhase::Module));
        assert!(outcome.message().unwrap().contains("boom"));
    }

    #[test]
    fn render_throw_is_reported_in_render_phase() {
        let code = "export default function App() { throw new Error('render boom'); }";
        let outcome = preflight(code, TIMEOUT).unwrap();
        assert_eq!(
            outcome,
            PreflightOutcome::RuntimeError {
                phase: BoundaryPhase::Render,
                message: "Error: render boom".into()
            }
        );
    }

    #[test]
    fn syntax_error_is_a_compile_error() {
        let outcome = preflight("function App( { return 1 }", TIMEOUT).unwrap();
        assert!(matches!(outcome, PreflightOutcome::CompileError { .. }));
    }

    #[test]
    fn broken_jsx_is_a_compile_error() {
        let outcome = preflight("export default function App() { return <div>; }", TIMEOUT).unwrap();
        assert!(matches!(outcome, PreflightOutcome::CompileError { .. }));
    }

    #[test]
    fn no_component_means_missing_entry() {
        let outcome = preflight("const answer = 42;", TIMEOUT).unwrap();
        assert_eq!(
            outcome,
            PreflightOutcome::MissingEntry {
                message: MISSING_ENTRY_MESSAGE.into()
            }
        );
    }

    #[test]
    fn endless_loop_times_out() {
        let outcome = preflight("while (true) {}", Duration::from_millis(500)).unwrap();
        assert!(matches!(outcome, PreflightOutcome::TimedOut { .. }));
    }

    #[test]
    fn failure_produces_report_and_banner() {
        let id = BoundaryId::new();
        let outcome = PreflightOutcome::CompileError {
            message: "bad <token>".into(),
        };
        let report = outcome.report(id).unwrap();
        assert_eq!(report.phase, BoundaryPhase::Compile);
        let doc = outcome.diagnostic_document().unwrap();
        assert!(doc.contains("bad &lt;token&gt;"));
    }
}
