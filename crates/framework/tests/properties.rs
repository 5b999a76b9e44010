//! Property tests over random module sequences.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use proptest::prelude::*;

use edm_framework::{
    Event, EventId, ModuleDescription, NoopObserver, ProcessConfig, ProductId, ProductStore,
    StoreError, Timestamp,
};

/// One module's behaviour in a generated sequence.
#[derive(Debug, Clone)]
struct Step {
    /// Indices (mod number of committed products) to read before staging.
    reads: Vec<usize>,
    /// Indices to read after staging, before commit.
    late_reads: Vec<usize>,
    /// Values to stage, each under an instance label owned by this module.
    outputs: Vec<u32>,
    /// Also stage a value under the instance label every module competes for.
    shared: bool,
    /// Whether the module fails instead of committing.
    fails: bool,
}

fn step() -> impl Strategy<Value = Step> {
    (
        prop::collection::vec(0usize..64, 0..4),
        prop::collection::vec(0usize..64, 0..3),
        prop::collection::vec(any::<u32>(), 0..4),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(reads, late_reads, outputs, shared, fails)| Step {
            reads,
            late_reads,
            outputs,
            shared,
            fails,
        })
}

fn new_store() -> ProductStore {
    ProductStore::new(EventId::new(1, 1), Timestamp::default(), ProcessConfig::default())
        .with_observer(Arc::new(NoopObserver))
}

/// What the test expects for each committed product.
#[derive(Debug)]
struct Expected {
    id: ProductId,
    value: u32,
    parents: BTreeSet<ProductId>,
}

fn read_some(
    event: &Event<'_>,
    committed: &[Expected],
    picks: &[usize],
    read: &mut BTreeSet<ProductId>,
) {
    if committed.is_empty() {
        return;
    }
    for &r in picks {
        let target = committed[r % committed.len()].id;
        event.get::<u32>(target).unwrap();
        read.insert(target);
    }
}

fn run(steps: &[Step]) -> (ProductStore, Vec<Expected>) {
    let mut store = new_store();
    let mut committed: Vec<Expected> = Vec::new();
    let mut shared_taken = false;

    for (n, step) in steps.iter().enumerate() {
        let module = ModuleDescription::new(format!("m{n}"), "Generated", store.process());
        let before = store.snapshot();

        let mut event = Event::new(&mut store, module);
        let mut read = BTreeSet::new();
        read_some(&event, &committed, &step.reads, &mut read);

        let mut values = Vec::new();
        for (i, &value) in step.outputs.iter().enumerate() {
            event.put(value, format!("m{n}-out{i}")).unwrap();
            values.push(value);
        }
        if step.shared {
            let value = step.outputs.first().copied().unwrap_or_default();
            event.put(value, "shared").unwrap();
            values.push(value);
        }

        read_some(&event, &committed, &step.late_reads, &mut read);

        if step.fails {
            event.discard();
            assert_eq!(store.snapshot(), before);
            continue;
        }

        if step.shared && shared_taken {
            let err = event.commit().unwrap_err();
            assert!(matches!(err, StoreError::DuplicateLabel { .. }));
            drop(event);
            assert_eq!(store.snapshot(), before);
            continue;
        }

        let ids = event.commit().unwrap();
        assert_eq!(ids.len(), values.len());
        shared_taken |= step.shared;
        for (id, value) in ids.into_iter().zip(values) {
            committed.push(Expected {
                id,
                value,
                parents: read.clone(),
            });
        }
    }

    (store, committed)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        ..ProptestConfig::default()
    })]

    /// Property: every committed product is returned unchanged by its id,
    /// no matter how many modules committed after it.
    #[test]
    fn committed_products_are_immutable(steps in prop::collection::vec(step(), 1..12)) {
        let (store, committed) = run(&steps);
        for e in &committed {
            prop_assert_eq!(*store.get::<u32>(e.id).unwrap(), e.value);
        }
        prop_assert_eq!(store.len(), committed.len());
    }

    /// Property: parents are exactly the ids the module read before committing.
    #[test]
    fn parents_match_reads(steps in prop::collection::vec(step(), 1..12)) {
        let (store, committed) = run(&steps);
        for e in &committed {
            let prov = store.get_provenance(e.id).unwrap();
            prop_assert_eq!(prov.parents(), &e.parents);
            prop_assert!(prov.parents().iter().all(|p| *p < e.id));
        }
    }

    /// Property: identifiers are unique, and so is (type, instance label)
    /// across all modules.
    #[test]
    fn identifiers_and_labels_are_unique(steps in prop::collection::vec(step(), 1..12)) {
        let (store, _) = run(&steps);
        let all = store.get_all_provenance();

        let ids: HashSet<ProductId> = all.iter().map(|p| p.id()).collect();
        prop_assert_eq!(ids.len(), all.len());

        let labels: HashSet<(String, String)> = all
            .iter()
            .map(|p| {
                let d = p.description();
                (d.type_name.clone(), d.instance_label.clone())
            })
            .collect();
        prop_assert_eq!(labels.len(), all.len());
        let shared = all
            .iter()
            .filter(|p| p.description().instance_label() == "shared")
            .count();
        prop_assert!(shared <= 1);
    }
}
