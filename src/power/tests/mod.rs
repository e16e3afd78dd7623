//! Unit tests for the power module
//!
//! Covers the transition table, status parsing and both timer backends.
//! Controller scenarios with real timing live in `tests/power_controller.rs`.

#![allow(clippy::panic, clippy::unwrap_used)]

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use crate::power::{
    DebounceConfig, DebounceKind, DebounceTimer, PlaybackStatus, PlayerId, PowerError,
    PowerState, ThreadTimer, TokioTimer,
    machine::{PowerStateMachine, Transition},
};

fn player(name: &str) -> PlayerId {
    PlayerId::from_bus_name(&format!("org.mpris.MediaPlayer2.{name}"))
}

fn apply(machine: &mut PowerStateMachine, name: &str, status: PlaybackStatus) -> Transition {
    machine.apply(player(name), status).unwrap()
}

fn counting_callback(counter: &Arc<AtomicUsize>) -> Box<dyn FnOnce() + Send> {
    let counter = Arc::clone(counter);
    Box::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    })
}

mod status {
    use super::*;

    #[test]
    fn parses_mpris_statuses() {
        assert_eq!("Playing".parse::<PlaybackStatus>().unwrap(), PlaybackStatus::Playing);
        assert_eq!("Paused".parse::<PlaybackStatus>().unwrap(), PlaybackStatus::Paused);
        assert_eq!("Stopped".parse::<PlaybackStatus>().unwrap(), PlaybackStatus::Stopped);
    }

    #[test]
    fn parses_upnp_transport_states() {
        assert_eq!("PLAYING".parse::<PlaybackStatus>().unwrap(), PlaybackStatus::Playing);
        assert_eq!(
            "PAUSED_PLAYBACK".parse::<PlaybackStatus>().unwrap(),
            PlaybackStatus::Paused
        );
        assert_eq!("STOPPED".parse::<PlaybackStatus>().unwrap(), PlaybackStatus::Stopped);
    }

    #[test]
    fn rejects_unknown_status() {
        for raw in ["", "playing", "Buffering", "TRANSITIONING"] {
            match raw.parse::<PlaybackStatus>() {
                Err(PowerError::InvalidStatus(status)) => assert_eq!(status, raw),
                other => panic!("expected InvalidStatus for {raw:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn debounce_from_secs_validates() {
        let debounce = DebounceConfig::from_secs(60.0, 0.5).unwrap();
        assert_eq!(debounce.delay(DebounceKind::Pause), Duration::from_secs(60));
        assert_eq!(debounce.delay(DebounceKind::Stop), Duration::from_millis(500));

        assert!(DebounceConfig::from_secs(0.0, 0.0).is_ok());
        assert!(matches!(
            DebounceConfig::from_secs(-1.0, 5.0),
            Err(PowerError::InvalidTimeout { name: "pause", .. })
        ));
        assert!(matches!(
            DebounceConfig::from_secs(60.0, f64::NAN),
            Err(PowerError::InvalidTimeout { name: "stop", .. })
        ));
    }
}

mod machine {
    use super::*;

    #[test]
    fn starts_idle() {
        let machine = PowerStateMachine::new();

        assert_eq!(machine.state(), PowerState::Idle);
        assert!(machine.pending().is_none());
        assert!(machine.snapshot().active_players.is_empty());
    }

    #[test]
    fn playing_from_idle_activates() {
        let mut machine = PowerStateMachine::new();

        let transition = apply(&mut machine, "a", PlaybackStatus::Playing);

        assert!(transition.activate);
        assert!(transition.cancel.is_none());
        assert_eq!(machine.state(), PowerState::Active);
        assert_eq!(machine.snapshot().active_players, vec![player("a")]);
    }

    #[test]
    fn second_player_does_not_activate_again() {
        let mut machine = PowerStateMachine::new();
        apply(&mut machine, "a", PlaybackStatus::Playing);

        let transition = apply(&mut machine, "b", PlaybackStatus::Playing);

        assert!(transition.is_noop());
        assert_eq!(machine.snapshot().active_players.len(), 2);
    }

    #[test]
    fn repeated_playing_is_idempotent() {
        let mut machine = PowerStateMachine::new();
        apply(&mut machine, "a", PlaybackStatus::Playing);

        assert!(apply(&mut machine, "a", PlaybackStatus::Playing).is_noop());
        assert_eq!(machine.snapshot().active_players.len(), 1);
    }

    #[test]
    fn last_player_pausing_arms_long_timer() {
        let mut machine = PowerStateMachine::new();
        apply(&mut machine, "a", PlaybackStatus::Playing);

        let transition = apply(&mut machine, "a", PlaybackStatus::Paused);

        let armed = transition.arm.unwrap();
        assert_eq!(armed.kind, DebounceKind::Pause);
        assert_eq!(machine.pending(), Some(armed));
        assert_eq!(machine.state(), PowerState::Paused);
    }

    #[test]
    fn pausing_while_others_play_arms_nothing() {
        let mut machine = PowerStateMachine::new();
        apply(&mut machine, "a", PlaybackStatus::Playing);
        apply(&mut machine, "b", PlaybackStatus::Playing);

        assert!(apply(&mut machine, "a", PlaybackStatus::Paused).is_noop());
        assert!(apply(&mut machine, "a", PlaybackStatus::Stopped).is_noop());
        assert_eq!(machine.state(), PowerState::Active);
        assert!(machine.pending().is_none());
    }

    #[test]
    fn playing_after_pause_cancels_timer_without_activation() {
        let mut machine = PowerStateMachine::new();
        apply(&mut machine, "a", PlaybackStatus::Playing);
        let armed = apply(&mut machine, "a", PlaybackStatus::Paused).arm;

        let transition = apply(&mut machine, "a", PlaybackStatus::Playing);

        assert_eq!(transition.cancel, armed);
        assert!(!transition.activate);
        assert_eq!(machine.state(), PowerState::Active);
        assert!(machine.pending().is_none());
    }

    #[test]
    fn stop_after_pause_tightens_to_short_timer() {
        let mut machine = PowerStateMachine::new();
        apply(&mut machine, "a", PlaybackStatus::Playing);
        let long = apply(&mut machine, "a", PlaybackStatus::Paused).arm;

        let transition = apply(&mut machine, "a", PlaybackStatus::Stopped);

        assert_eq!(transition.cancel, long);
        let short = transition.arm.unwrap();
        assert_eq!(short.kind, DebounceKind::Stop);
        assert_eq!(machine.pending(), Some(short));
        assert_eq!(machine.state(), PowerState::Active);
    }

    #[test]
    fn repeated_stop_arms_once() {
        let mut machine = PowerStateMachine::new();
        apply(&mut machine, "a", PlaybackStatus::Playing);

        let first = apply(&mut machine, "a", PlaybackStatus::Stopped);
        let second = apply(&mut machine, "a", PlaybackStatus::Stopped);

        assert_eq!(first.arm.map(|t| t.kind), Some(DebounceKind::Stop));
        assert!(second.is_noop());
        assert_eq!(machine.pending(), first.arm);
    }

    #[test]
    fn repeated_pause_keeps_original_timer() {
        let mut machine = PowerStateMachine::new();
        apply(&mut machine, "a", PlaybackStatus::Playing);
        let first = apply(&mut machine, "a", PlaybackStatus::Paused).arm;

        assert!(apply(&mut machine, "a", PlaybackStatus::Paused).is_noop());
        assert_eq!(machine.pending(), first);
    }

    #[test]
    fn updates_while_idle_are_noops() {
        let mut machine = PowerStateMachine::new();

        assert!(apply(&mut machine, "a", PlaybackStatus::Paused).is_noop());
        assert!(apply(&mut machine, "a", PlaybackStatus::Stopped).is_noop());
        assert_eq!(machine.state(), PowerState::Idle);
        assert!(machine.pending().is_none());
    }

    #[test]
    fn pause_during_short_timer_is_an_invariant_violation() {
        let mut machine = PowerStateMachine::new();
        apply(&mut machine, "a", PlaybackStatus::Playing);
        let short = apply(&mut machine, "a", PlaybackStatus::Stopped).arm;

        let result = machine.apply(player("a"), PlaybackStatus::Paused);

        assert!(matches!(result, Err(PowerError::InvariantViolation(_))));
        assert_eq!(machine.state(), PowerState::Active);
        assert_eq!(machine.pending(), short);
    }

    #[test]
    fn only_the_pending_timer_deactivates() {
        let mut machine = PowerStateMachine::new();
        apply(&mut machine, "a", PlaybackStatus::Playing);
        let long = apply(&mut machine, "a", PlaybackStatus::Paused).arm.unwrap();
        let short = apply(&mut machine, "a", PlaybackStatus::Stopped).arm.unwrap();

        assert!(short.generation > long.generation);
        assert!(!machine.timer_fired(long.generation));
        assert_eq!(machine.pending(), Some(short));

        assert!(machine.timer_fired(short.generation));
        assert!(machine.pending().is_none());
        assert!(!machine.timer_fired(short.generation));

        machine.deactivated();
        assert_eq!(machine.state(), PowerState::Idle);
    }

    #[test]
    fn cancelled_timer_firing_late_is_ignored() {
        let mut machine = PowerStateMachine::new();
        apply(&mut machine, "a", PlaybackStatus::Playing);
        let long = apply(&mut machine, "a", PlaybackStatus::Paused).arm.unwrap();
        apply(&mut machine, "a", PlaybackStatus::Playing);

        assert!(!machine.timer_fired(long.generation));
        assert_eq!(machine.state(), PowerState::Active);
    }

    #[test]
    fn player_can_return_after_removal() {
        let mut machine = PowerStateMachine::new();
        apply(&mut machine, "a", PlaybackStatus::Playing);
        let short = apply(&mut machine, "a", PlaybackStatus::Stopped).arm.unwrap();
        machine.timer_fired(short.generation);
        machine.deactivated();

        let transition = apply(&mut machine, "a", PlaybackStatus::Playing);

        assert!(transition.activate);
        assert_eq!(machine.snapshot().active_players, vec![player("a")]);
    }

    #[test]
    fn removing_unknown_player_while_paused_keeps_long_timer() {
        let mut machine = PowerStateMachine::new();
        apply(&mut machine, "a", PlaybackStatus::Playing);
        let long = apply(&mut machine, "a", PlaybackStatus::Paused).arm;

        let transition = machine.remove(&player("ghost")).unwrap();

        assert!(transition.is_noop());
        assert_eq!(machine.state(), PowerState::Paused);
        assert_eq!(machine.pending(), long);
    }

    #[test]
    fn first_stop_from_new_player_while_paused_keeps_long_timer() {
        let mut machine = PowerStateMachine::new();
        apply(&mut machine, "a", PlaybackStatus::Playing);
        let long = apply(&mut machine, "a", PlaybackStatus::Paused).arm;

        assert!(apply(&mut machine, "idle", PlaybackStatus::Stopped).is_noop());
        assert!(machine.remove(&player("idle")).unwrap().is_noop());
        assert_eq!(machine.state(), PowerState::Paused);
        assert_eq!(machine.pending(), long);
    }

    #[test]
    fn removing_paused_player_tightens_to_short_timer() {
        let mut machine = PowerStateMachine::new();
        apply(&mut machine, "a", PlaybackStatus::Playing);
        let long = apply(&mut machine, "a", PlaybackStatus::Paused).arm;

        let transition = machine.remove(&player("a")).unwrap();

        assert_eq!(transition.cancel, long);
        assert_eq!(transition.arm.map(|t| t.kind), Some(DebounceKind::Stop));
        assert_eq!(machine.state(), PowerState::Active);
    }

    #[test]
    fn removing_playing_player_arms_short_timer() {
        let mut machine = PowerStateMachine::new();
        apply(&mut machine, "a", PlaybackStatus::Playing);

        let transition = machine.remove(&player("a")).unwrap();

        assert_eq!(transition.arm.map(|t| t.kind), Some(DebounceKind::Stop));
        assert!(machine.snapshot().active_players.is_empty());
        assert!(machine.remove(&player("a")).unwrap().is_noop());
    }

    #[test]
    fn snapshot_lists_players_sorted() {
        let mut machine = PowerStateMachine::new();
        apply(&mut machine, "vlc", PlaybackStatus::Playing);
        apply(&mut machine, "mpd", PlaybackStatus::Playing);

        let snapshot = machine.snapshot();

        assert_eq!(snapshot.state, PowerState::Active);
        assert_eq!(snapshot.active_players, vec![player("mpd"), player("vlc")]);
        assert!(snapshot.pending_timer.is_none());
    }
}

mod timers {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn tokio_timer_fires_once_after_delay() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut timer = TokioTimer::default();

        timer.start(Duration::from_secs(5), counting_callback(&fired)).unwrap();

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        timer.cancel();
        timer.cancel();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_timer_cancel_prevents_firing() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut timer = TokioTimer::default();

        timer.start(Duration::from_secs(60), counting_callback(&fired)).unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        timer.cancel();
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_timer_restart_replaces_previous() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let mut timer = TokioTimer::default();

        timer.start(Duration::from_secs(60), counting_callback(&first)).unwrap();
        timer.start(Duration::from_secs(5), counting_callback(&second)).unwrap();

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_timer_zero_delay_fires() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut timer = TokioTimer::default();

        timer.start(Duration::ZERO, counting_callback(&fired)).unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn thread_timer_fires_once() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut timer = ThreadTimer::default();

        timer.start(Duration::from_millis(10), counting_callback(&fired)).unwrap();
        std::thread::sleep(Duration::from_millis(300));

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        timer.cancel();
    }

    #[test]
    fn thread_timer_cancel_prevents_firing() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut timer = ThreadTimer::default();

        timer.start(Duration::from_millis(200), counting_callback(&fired)).unwrap();
        timer.cancel();

        std::thread::sleep(Duration::from_millis(400));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}

mod actions {
    use crate::power::{ActionError, CommandActions, CommandStep, LogActions, PowerActions};

    use super::*;

    fn commands(activate: Vec<CommandStep>, deactivate: Vec<CommandStep>) -> CommandActions {
        CommandActions::new(activate, deactivate, Duration::ZERO)
    }

    #[tokio::test]
    async fn log_actions_always_succeed() {
        assert!(LogActions.activate().await.is_ok());
        assert!(LogActions.deactivate().await.is_ok());
    }

    #[tokio::test]
    async fn successful_steps_run_in_order() {
        let actions = commands(
            vec![CommandStep::new("true", &[]), CommandStep::new("true", &["--ignored"])],
            vec![],
        );

        assert!(actions.activate().await.is_ok());
        assert!(actions.deactivate().await.is_ok());
    }

    #[tokio::test]
    async fn failing_step_aborts_sequence() {
        let actions = commands(
            vec![],
            vec![
                CommandStep::new("false", &[]),
                CommandStep::new("autopower-missing-program", &[]),
            ],
        );

        let result = actions.deactivate().await;

        assert!(
            matches!(result, Err(ActionError::CommandFailed { ref program, .. }) if program == "false")
        );
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let actions = commands(vec![CommandStep::new("autopower-missing-program", &[])], vec![]);

        let result = actions.activate().await;

        assert!(matches!(result, Err(ActionError::Spawn { .. })));
    }
}
