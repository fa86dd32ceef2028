use super::tests::{Call, RecordingHost, resolver};
use super::*;
use evdev::KeyCode as K;
use proptest::prelude::*;
use std::collections::HashSet;

const KEYS: [K; 6] = [K::KEY_A, K::KEY_J, K::KEY_F, K::KEY_D, K::KEY_K, K::KEY_SPACE];

#[derive(Debug, Clone)]
enum Op {
    /// Press the key if it is up, release it otherwise.
    Toggle(usize),
    Advance(u32),
    Tick,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..KEYS.len()).prop_map(Op::Toggle),
        2 => (1u32..150).prop_map(Op::Advance),
        1 => Just(Op::Tick),
    ]
}

fn settings() -> impl Strategy<Value = ResolverSettings> {
    (any::<bool>(), prop::option::of(50u16..200), 0u16..3).prop_map(
        |(eager_mods, streak_window, tap_delay)| ResolverSettings {
            eager_mods,
            streak_window,
            tap_delay,
            ..Default::default()
        },
    )
}

/// Synthetic presses per tap-hold key since it was last absorbed.
fn settlements(calls: &[Call], key: K) -> usize {
    calls
        .iter()
        .filter(|call| matches!(call, Call::Dispatch(r) if r.key == key && r.pressed && r.tap.is_some()))
        .count()
}

proptest! {
    #[test]
    fn resolver_invariants_hold(
        settings in settings(),
        start in any::<u32>(),
        ops in prop::collection::vec(op(), 1..80),
    ) {
        let mut resolver = resolver(settings);
        let mut host = RecordingHost::default();
        let mut now = Timestamp(start);
        let mut down: HashSet<K> = HashSet::new();
        // Calls since each tap-hold key was last absorbed by the resolver.
        let mut since_absorbed: Vec<(K, usize)> = Vec::new();

        for op in ops {
            match op {
                Op::Toggle(index) => {
                    let key = KEYS[index];
                    let pressed = down.insert(key);
                    if !pressed {
                        down.remove(&key);
                    }
                    let record = KeyRecord::new(key, pressed, now);
                    let before = host.calls.len();
                    host.feed(&mut resolver, record);
                    if pressed {
                        since_absorbed.retain(|(k, _)| *k != key);
                        if resolver.pending_key() == Some(key) {
                            since_absorbed.push((key, before));
                        }
                    }
                }
                Op::Advance(ms) => now = now.wrapping_add(ms),
                Op::Tick => resolver.on_tick(&mut host, now).unwrap(),
            }

            prop_assert_ne!(resolver.state(), ResolverState::Recursing);
            if !resolver.eager_mods().is_empty() {
                prop_assert!(resolver.pending_key().is_some());
            }
            for (key, from) in &since_absorbed {
                prop_assert!(settlements(&host.calls[*from..], *key) <= 1);
            }
        }

        // Let go of everything: nothing stays pending and every absorbed key settled once.
        let held: Vec<K> = down.iter().copied().collect();
        for key in held {
            host.feed(&mut resolver, KeyRecord::release(key, now));
        }
        prop_assert_eq!(resolver.state(), ResolverState::Released);
        prop_assert_eq!(resolver.pending_key(), None);
        prop_assert!(resolver.eager_mods().is_empty());
        for (key, from) in &since_absorbed {
            let eager = host.calls[*from..].iter().any(|call| matches!(call, Call::Action(r, Action::ModsTap { .. }) if r.key == *key && r.pressed));
            let settled = settlements(&host.calls[*from..], *key);
            prop_assert!(settled == 1 || (eager && settled == 0));
        }

        // Injected records only ever saw the guard.
        let injected = host.injected().len();
        let recursing = host.states.iter().filter(|s| **s == ResolverState::Recursing).count();
        prop_assert_eq!(injected, recursing);
    }

    #[test]
    fn ticks_after_settling_emit_nothing(
        hold_for in 200u32..2000,
        ticks in prop::collection::vec(1u32..500, 1..20),
    ) {
        let mut resolver = resolver(ResolverSettings::default());
        let mut host = RecordingHost::default();

        host.feed(&mut resolver, KeyRecord::press(K::KEY_A, Timestamp(0)));
        resolver.on_tick(&mut host, Timestamp(hold_for)).unwrap();
        prop_assert_eq!(host.take().len(), 1);

        let mut now = hold_for;
        for step in ticks {
            now += step;
            resolver.on_tick(&mut host, Timestamp(now)).unwrap();
        }
        prop_assert!(host.calls.is_empty());
        prop_assert_eq!(resolver.state(), ResolverState::Holding);
    }
}
