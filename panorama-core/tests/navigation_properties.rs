//! Property-based tests for slot state transitions and signal delivery

use panorama_core::events::{EventBus, InitNavigation, Loading, Navigate, PluginRef, Unload};
use panorama_core::navigation::{ComposerConfig, LinkMode, NavigationComposer, SlotState, SlotTable};
use panorama_core::HostLink;
use panorama_plugin_api::{
    PluginDescriptor, PluginNavigate, PluginNavigationInit, PluginNavigationItem,
};
use proptest::prelude::*;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum Step {
    Loading,
    Init(Vec<String>),
    Unload,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        Just(Step::Loading),
        prop::collection::vec("[a-z]{1,6}", 0..4).prop_map(Step::Init),
        Just(Step::Unload),
    ]
}

fn items(labels: &[String]) -> Vec<PluginNavigationItem> {
    labels
        .iter()
        .map(|l| PluginNavigationItem::leaf(l.clone(), format!("/{l}")))
        .collect()
}

fn composer() -> (EventBus, NavigationComposer) {
    let bus = EventBus::new();
    let plugins = vec![PluginDescriptor::new("p", "P")];
    let composer = NavigationComposer::attach(
        bus.clone(),
        SlotTable::new(&plugins),
        ComposerConfig {
            base_path: "/app".to_string(),
            host_links: vec![HostLink::new("Home", "/app/")],
            plugins,
            link_mode: LinkMode::Router,
        },
    );
    (bus, composer)
}

/// Reference model: INIT only lands while a LOADING is pending
fn model(steps: &[Step]) -> SlotState {
    steps.iter().fold(SlotState::Idle, |state, step| match step {
        Step::Loading => SlotState::Loading,
        Step::Init(labels) if state == SlotState::Loading => SlotState::Loaded(items(labels)),
        Step::Init(_) => state,
        Step::Unload => SlotState::Idle,
    })
}

proptest! {
    // The composer's slot state always matches the reference model
    #[test]
    fn slot_state_follows_most_recent_signal(steps in prop::collection::vec(step(), 0..12)) {
        let (bus, composer) = composer();
        for step in &steps {
            match step {
                Step::Loading => { bus.emit::<Loading>(PluginRef::new("p")); }
                Step::Init(labels) => {
                    bus.emit::<InitNavigation>(PluginNavigationInit {
                        plugin_id: "p".to_string(),
                        items: items(labels),
                    });
                }
                Step::Unload => { bus.emit::<Unload>(PluginRef::new("p")); }
            }
        }
        prop_assert_eq!(composer.state("p"), Some(model(&steps)));
    }

    // Loaded is never reached without a LOADING before it
    #[test]
    fn init_alone_never_loads(labels in prop::collection::vec("[a-z]{1,6}", 0..4), repeats in 1usize..4) {
        let (bus, composer) = composer();
        for _ in 0..repeats {
            bus.emit::<InitNavigation>(PluginNavigationInit {
                plugin_id: "p".to_string(),
                items: items(&labels),
            });
        }
        prop_assert_eq!(composer.state("p"), Some(SlotState::Idle));
    }

    // A NAVIGATE published before a listener exists is never delivered to it
    #[test]
    fn navigate_is_never_replayed(before in 1usize..5, after in 0usize..5) {
        let bus = EventBus::new();
        let target = PluginDescriptor::new("p", "P");
        for i in 0..before {
            bus.emit::<Navigate>(PluginNavigate::to_plugin(target.clone(), format!("/early/{i}")));
        }

        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = seen.clone();
            bus.subscribe::<Navigate>(move |nav| seen.lock().unwrap().push(nav.to.clone()));
        }
        for i in 0..after {
            bus.emit::<Navigate>(PluginNavigate::to_plugin(target.clone(), format!("/late/{i}")));
        }

        let seen = seen.lock().unwrap();
        prop_assert_eq!(seen.len(), after);
        prop_assert!(seen.iter().all(|to| to.starts_with("/late/")));
    }
}
