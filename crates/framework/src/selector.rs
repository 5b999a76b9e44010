//! Selectors: predicates over product metadata used to narrow lookups.
//!
//! A selector only sees the [`ProductDescription`] of a candidate, never the
//! product itself. Selectors compose with `&`, `|` and `!`:
//!
//! ```ignore
//! let sel = ModuleLabelSelector::new("tracker") & !InstanceLabelSelector::new("raw");
//! let tracks = event.get_many::<Tracks, _>(&sel)?;
//! ```
//!
//! Any `Fn(&ProductDescription) -> bool` closure is a selector as well.

use core::ops::{BitAnd, BitOr, Not};

use crate::provenance::ProductDescription;

/// Predicate over product metadata.
pub trait Selector {
    fn matches(&self, description: &ProductDescription) -> bool;
}

impl<F> Selector for F
where
    F: Fn(&ProductDescription) -> bool,
{
    fn matches(&self, description: &ProductDescription) -> bool {
        self(description)
    }
}

/// Matches every product.
#[derive(Debug, Copy, Clone, Default)]
pub struct MatchAllSelector;

impl Selector for MatchAllSelector {
    fn matches(&self, _description: &ProductDescription) -> bool {
        true
    }
}

/// Matches products created by the module with this label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleLabelSelector {
    label: String,
}

impl ModuleLabelSelector {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl Selector for ModuleLabelSelector {
    fn matches(&self, description: &ProductDescription) -> bool {
        description.module_label() == self.label
    }
}

/// Matches products created in the named process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessNameSelector {
    process_name: String,
}

impl ProcessNameSelector {
    pub fn new(process_name: impl Into<String>) -> Self {
        Self {
            process_name: process_name.into(),
        }
    }
}

impl Selector for ProcessNameSelector {
    fn matches(&self, description: &ProductDescription) -> bool {
        description.process_name() == self.process_name
    }
}

/// Matches products with this instance label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceLabelSelector {
    instance_label: String,
}

impl InstanceLabelSelector {
    pub fn new(instance_label: impl Into<String>) -> Self {
        Self {
            instance_label: instance_label.into(),
        }
    }
}

impl Selector for InstanceLabelSelector {
    fn matches(&self, description: &ProductDescription) -> bool {
        description.instance_label() == self.instance_label
    }
}

/// Both selectors must match.
#[derive(Debug, Clone)]
pub struct AndSelector<A, B>(A, B);

impl<A: Selector, B: Selector> Selector for AndSelector<A, B> {
    fn matches(&self, description: &ProductDescription) -> bool {
        self.0.matches(description) && self.1.matches(description)
    }
}

/// Either selector must match.
#[derive(Debug, Clone)]
pub struct OrSelector<A, B>(A, B);

impl<A: Selector, B: Selector> Selector for OrSelector<A, B> {
    fn matches(&self, description: &ProductDescription) -> bool {
        self.0.matches(description) || self.1.matches(description)
    }
}

/// Inverts a selector.
#[derive(Debug, Clone)]
pub struct NotSelector<A>(A);

impl<A: Selector> Selector for NotSelector<A> {
    fn matches(&self, description: &ProductDescription) -> bool {
        !self.0.matches(description)
    }
}

macro_rules! impl_selector_ops {
    ([$($gen:tt)*] $t:ty) => {
        impl<$($gen)* Rhs: Selector> BitAnd<Rhs> for $t {
            type Output = AndSelector<Self, Rhs>;

            fn bitand(self, rhs: Rhs) -> Self::Output {
                AndSelector(self, rhs)
            }
        }

        impl<$($gen)* Rhs: Selector> BitOr<Rhs> for $t {
            type Output = OrSelector<Self, Rhs>;

            fn bitor(self, rhs: Rhs) -> Self::Output {
                OrSelector(self, rhs)
            }
        }

        impl<$($gen)*> Not for $t {
            type Output = NotSelector<Self>;

            fn not(self) -> Self::Output {
                NotSelector(self)
            }
        }
    };
}

impl_selector_ops!([] MatchAllSelector);
impl_selector_ops!([] ModuleLabelSelector);
impl_selector_ops!([] ProcessNameSelector);
impl_selector_ops!([] InstanceLabelSelector);
impl_selector_ops!([A: Selector, B: Selector,] AndSelector<A, B>);
impl_selector_ops!([A: Selector, B: Selector,] OrSelector<A, B>);
impl_selector_ops!([A: Selector,] NotSelector<A>);
