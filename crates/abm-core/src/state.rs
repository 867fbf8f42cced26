//! Agent state: a keyed attribute bag with partial-equality matching.
//!
//! # Design
//!
//! A [`State`] is an insertion-ordered map from a domain name to a typed
//! vector [`Value`].  The empty name `""` is a legal, distinguished key: it
//! is the "unnamed slot" and there is at most one of it.  Keeping the slots
//! in a `Vec` preserves insertion order and is faster than a hash map for
//! the handful of domains a real agent state carries.
//!
//! Matching is *partial* equality: a state matches a [`Pattern`] iff every
//! slot of the pattern agrees with the state.  Slots the pattern does not
//! mention are ignored, so the empty pattern matches every state.  A pattern
//! slot may carry a predicate instead of a value; the predicate receives the
//! state's value and its verdict is used in place of the equality test.
//!
//! Comparison is type-exact: integer, float and string vectors never compare
//! equal across types, and there is no implicit widening.

use std::fmt;
use std::rc::Rc;

// ── Value ─────────────────────────────────────────────────────────────────────

/// A typed state value: a vector of integers, floats, or strings.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Ints(Vec<i64>),
    Floats(Vec<f64>),
    Strings(Vec<String>),
}

impl Value {
    /// The first element as `f64`, if this value is numeric and non-empty.
    /// Integer values are widened for reporting only — matching never widens.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Ints(v) => v.first().map(|&x| x as f64),
            Value::Floats(v) => v.first().copied(),
            Value::Strings(_) => None,
        }
    }

    /// The first element as `&str`, if this value holds strings.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Strings(v) => v.first().map(String::as_str),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(x: i64) -> Value {
        Value::Ints(vec![x])
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Value {
        Value::Floats(vec![x])
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::Strings(vec![s.to_string()])
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::Strings(vec![s])
    }
}

impl From<Vec<i64>> for Value {
    fn from(v: Vec<i64>) -> Value {
        Value::Ints(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Value {
        Value::Floats(v)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Value {
        Value::Strings(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Ints(v) => write!(f, "{v:?}"),
            Value::Floats(v) => write!(f, "{v:?}"),
            Value::Strings(v) => write!(f, "{v:?}"),
        }
    }
}

// ── State ─────────────────────────────────────────────────────────────────────

/// An insertion-ordered mapping from domain name to [`Value`].
///
/// The empty name is the distinguished "unnamed" slot; each name appears at
/// most once.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct State {
    slots: Vec<(String, Value)>,
}

impl State {
    /// An empty state.
    pub fn new() -> State {
        State::default()
    }

    /// A state holding a single slot.  Use `""` for the unnamed slot.
    pub fn of(name: impl Into<String>, value: impl Into<Value>) -> State {
        let mut s = State::new();
        s.set(name, value);
        s
    }

    /// Chainable slot insertion, for building multi-domain states inline.
    pub fn and(mut self, name: impl Into<String>, value: impl Into<Value>) -> State {
        self.set(name, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// The value stored under `name`, if any.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.slots.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Set one slot, overwriting in place or appending at the end.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.slots.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.slots.push((name, value)),
        }
    }

    /// Iterate the slots in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.slots.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Overwrite this state's slots with those of `other`.
    ///
    /// Named slots of `other` replace same-named slots here (or append);
    /// an unnamed slot of `other` replaces this state's unnamed slot (or
    /// appends one).  Slot order is stable: existing slots keep their
    /// position, new slots go to the end.  Idempotent and right-biased.
    pub fn merge(&mut self, other: &State) {
        for (name, value) in &other.slots {
            self.set(name.clone(), value.clone());
        }
    }

    /// Merged copy; `self` is unchanged.
    pub fn merged(&self, other: &State) -> State {
        let mut out = self.clone();
        out.merge(other);
        out
    }

    /// Partial-equality match against `pattern` (see module docs).
    ///
    /// Never fails: a missing key, a type mismatch, or unequal elements all
    /// yield `false`.
    pub fn matches(&self, pattern: &Pattern) -> bool {
        pattern
            .slots
            .iter()
            .all(|(name, matcher)| match self.get(name) {
                Some(value) => matcher.accepts(value),
                None => false,
            })
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (n, v)) in self.slots.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if n.is_empty() {
                write!(f, "{v}")?;
            } else {
                write!(f, "{n}: {v}")?;
            }
        }
        write!(f, "}}")
    }
}

// ── Pattern ───────────────────────────────────────────────────────────────────

/// A predicate on a single state value, used in place of an equality test.
pub type ValuePredicate = Rc<dyn Fn(&Value) -> bool>;

/// One pattern slot: an exact value or an arbitrary predicate.
#[derive(Clone)]
pub enum Matcher {
    /// Element-wise, type-exact equality.
    Equals(Value),
    /// Caller-supplied predicate over the state's value.
    Where(ValuePredicate),
}

impl Matcher {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            Matcher::Equals(expected) => expected == value,
            Matcher::Where(pred) => pred(value),
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Equals(v) => write!(f, "Equals({v})"),
            Matcher::Where(_) => write!(f, "Where(..)"),
        }
    }
}

/// A state pattern: named slots to be checked against a [`State`].
///
/// The empty pattern matches every state.  Patterns are cheaply clonable
/// (predicates are reference-counted).
#[derive(Clone, Debug, Default)]
pub struct Pattern {
    slots: Vec<(String, Matcher)>,
}

impl Pattern {
    /// The empty pattern, which matches everything.
    pub fn any() -> Pattern {
        Pattern::default()
    }

    /// A single-slot equality pattern.
    pub fn of(name: impl Into<String>, value: impl Into<Value>) -> Pattern {
        Pattern::any().and(name, value)
    }

    /// Chainable equality slot.
    pub fn and(mut self, name: impl Into<String>, value: impl Into<Value>) -> Pattern {
        self.slots.push((name.into(), Matcher::Equals(value.into())));
        self
    }

    /// Chainable predicate slot: the state's value for `name` is fed to
    /// `pred` and its verdict used in place of an equality test.
    pub fn and_where(
        mut self,
        name: impl Into<String>,
        pred: impl Fn(&Value) -> bool + 'static,
    ) -> Pattern {
        self.slots.push((name.into(), Matcher::Where(Rc::new(pred))));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterate the slots in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Matcher)> {
        self.slots.iter().map(|(n, m)| (n.as_str(), m))
    }
}

impl From<State> for Pattern {
    /// Every slot of the state becomes an equality slot.
    fn from(state: State) -> Pattern {
        Pattern {
            slots: state
                .slots
                .into_iter()
                .map(|(n, v)| (n, Matcher::Equals(v)))
                .collect(),
        }
    }
}

impl From<&State> for Pattern {
    fn from(state: &State) -> Pattern {
        Pattern::from(state.clone())
    }
}
