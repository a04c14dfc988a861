//! Whole-instance tests: several participants wired through an in-memory
//! network, exercising the authority, replication and the lobby together.

#[allow(dead_code)]
mod common;

use common::{Arena, HOST};
use shuriken_arena::config::ArenaConfig;
use shuriken_arena::level::Level;
use shuriken_arena::phase::Phase;
use shuriken_arena::pose::Vec3;
use shuriken_arena::projectile::{Contact, ContactOutcome, GripOutcome, ProjectileState};
use shuriken_core::host::Ownership;
use shuriken_core::net::messages::ObjectId;
use shuriken_core::player::PlayerId;

const GUEST: PlayerId = 2;
const LATECOMER: PlayerId = 3;

fn fighting_pair() -> Arena {
    let mut arena = Arena::new(2);
    arena.join(HOST);
    arena.join(GUEST);
    arena.start(HOST);
    arena.run_for(3_000);
    assert_eq!(arena.phase(), Phase::Fighting);
    arena
}

#[test]
fn two_players_play_a_round_to_the_end() {
    let mut arena = Arena::new(2);
    arena.join(HOST);
    arena.join(GUEST);
    arena.assert_converged();
    assert_eq!(
        arena.peer(GUEST).participant.local_projectile().map(|p| p.slot()),
        Some(1)
    );

    // Anyone seated may start.
    arena.start(GUEST);
    assert_eq!(arena.phase(), Phase::RoundStarting);
    assert_ne!(arena.peer(GUEST).participant.session().level, Level::Lobby);
    arena.assert_converged();

    arena.run_for(2_900);
    assert_eq!(arena.phase(), Phase::RoundStarting);
    arena.run_for(100);
    assert_eq!(arena.phase(), Phase::Fighting);
    arena.assert_converged();

    for _ in 0..3 {
        arena.throw_at(HOST, GUEST);
    }
    let session = arena.peer(GUEST).participant.session();
    assert_eq!(session.slots.get(0).unwrap().score, 1);
    assert_eq!(session.slots.get(1).unwrap().lives, 0);
    assert_eq!(arena.peer(HOST).participant.stats().players_hit, 3);
    assert_eq!(arena.peer(HOST).participant.stats().players_killed, 1);

    let sliced = arena
        .peer(GUEST)
        .screen
        .banner_tops()
        .iter()
        .filter(|t| *t == "SLICED BY")
        .count();
    assert!(sliced >= 2, "victim saw {sliced} hit banners");

    // Elimination is confirmed after a short delay, not immediately.
    arena.run_for(100);
    assert_eq!(arena.phase(), Phase::Fighting);
    arena.run_for(1_600);
    assert_eq!(arena.phase(), Phase::RoundEnding);
    arena.assert_converged();
    assert!(arena.peer(GUEST).screen.log().scoreboards >= 1);
    for peer in &arena.peers {
        let slots = &peer.participant.session().slots;
        assert!(slots.occupants().all(|(_, s)| s.lives == 3));
    }

    arena.run_for(5_000);
    assert_eq!(arena.phase(), Phase::RoundStarting);
    assert_eq!(arena.peer(GUEST).participant.session().round, 2);
    arena.assert_converged();
}

#[test]
fn reaching_max_score_ends_the_game() {
    let mut arena = Arena::new(2);
    arena.join(HOST);
    arena.join(GUEST);

    arena.peer_mut(HOST).participant.adjust_max_score(-9);
    arena.pump();
    arena.peer_mut(GUEST).participant.adjust_max_score(5);
    arena.pump();
    assert_eq!(arena.peer(GUEST).participant.session().max_score, 1);

    arena.start(HOST);
    arena.run_for(3_000);
    for _ in 0..3 {
        arena.throw_at(GUEST, HOST);
    }
    arena.run_for(100);
    assert_eq!(arena.phase(), Phase::GameEnding);
    arena.assert_converged();
    assert_eq!(arena.peer(HOST).participant.session().level, Level::Lobby);

    let guest = arena.peer(GUEST);
    assert_eq!(guest.participant.stats().games_won, 1);
    assert_eq!(guest.participant.stats().games_played, 1);
    assert_eq!(guest.screen.banner_tops().last().map(String::as_str), Some("WINNER"));
    assert!(!guest.screen.log().teleports.is_empty());

    let host = arena.peer(HOST);
    assert_eq!(host.participant.stats().games_won, 0);
    assert_eq!(host.participant.stats().games_played, 1);
    assert_eq!(host.screen.banner_tops().last().map(String::as_str), Some("WINNER"));

    arena.run_for(8_000);
    assert_eq!(arena.phase(), Phase::Lobby);
    arena.assert_converged();
    let session = arena.peer(GUEST).participant.session();
    assert_eq!(session.round, 0);
    assert!(session.slots.occupants().all(|(_, s)| s.score == 0 && s.lives == 3));
}

#[test]
fn full_table_and_settings_belong_to_the_game_master() {
    let config = ArenaConfig {
        slot_capacity: 2,
        ..ArenaConfig::default()
    };
    let mut arena = Arena::with_config(3, config);
    arena.join(HOST);
    arena.join(GUEST);
    arena.join(LATECOMER);
    arena.assert_converged();

    let session = arena.peer(LATECOMER).participant.session();
    assert_eq!(session.slots.occupant_count(), 2);
    assert!(!session.is_joined(LATECOMER));
    assert!(arena.peer(LATECOMER).participant.local_projectile().is_none());
    assert!(arena.peer(LATECOMER).screen.log().hud.is_none());

    let host_view = arena.peer(HOST).screen.log().lobby.clone().unwrap();
    assert!(host_view.can_edit_settings);
    assert_eq!(host_view.game_master, "Game Master: Player1");
    assert_eq!(host_view.countdown_secs, Some(10));

    let guest_view = arena.peer(GUEST).screen.log().lobby.clone().unwrap();
    assert!(guest_view.joined);
    assert!(guest_view.can_start);
    assert!(!guest_view.can_edit_settings);
    assert_eq!(guest_view.countdown_secs, Some(30));

    arena.peer_mut(GUEST).participant.adjust_round_time(3);
    arena.pump();
    assert_eq!(arena.peer(HOST).participant.session().round_time_limit_secs, 120);
    arena.peer_mut(HOST).participant.adjust_round_time(3);
    arena.pump();
    assert_eq!(arena.peer(LATECOMER).participant.session().round_time_limit_secs, 150);

    arena.run_for(2_000);
    let host_view = arena.peer(HOST).screen.log().lobby.clone().unwrap();
    assert_eq!(host_view.countdown_secs, Some(8));
    assert_eq!(host_view.round_time, "150 SEC");
}

#[test]
fn strays_snap_back_and_foreign_grips_are_refused() {
    let mut arena = fighting_pair();
    let pose = arena.peer(GUEST).pose;

    let guest = &mut arena.peer_mut(GUEST).participant;
    assert_eq!(guest.grip(1, None), Some(GripOutcome::Held));
    guest.release(1, Vec3::new(0.0, 0.0, 8.0), pose.forward);
    assert_eq!(guest.projectile(1).unwrap().state(), ProjectileState::Thrown);
    guest.set_body(1, Vec3::new(0.0, 1.0, 55.0), Vec3::new(0.0, 0.0, 12.0));
    arena.frame();

    let projectile = arena.peer(GUEST).participant.projectile(1).unwrap();
    assert_eq!(projectile.state(), ProjectileState::AtRest);
    assert_eq!(projectile.velocity(), Vec3::ZERO);
    assert!(projectile.position().distance(pose.position) < 2.0);

    let host = &mut arena.peer_mut(HOST).participant;
    assert_eq!(host.grip(1, Some(&pose)), Some(GripOutcome::SnappedBack));
    assert_eq!(
        host.contact(1, Contact::Collider(0), &pose),
        ContactOutcome::Ignored
    );
}

#[test]
fn power_up_goes_to_first_contact() {
    let mut arena = fighting_pair();
    arena.run_for(7_000);
    arena.assert_converged();
    let pickup = arena.peer(GUEST).participant.session().pickups[0].id;

    let pose = arena.peer(GUEST).pose;
    let claimed = arena
        .peer_mut(GUEST)
        .participant
        .contact(1, Contact::Pickup(pickup), &pose);
    assert_eq!(claimed, ContactOutcome::PickupClaimed { pickup });
    arena.pump();

    assert!(arena.peer(HOST).participant.session().pickups.is_empty());
    let host_pose = arena.peer(HOST).pose;
    assert_eq!(
        arena
            .peer_mut(HOST)
            .participant
            .contact(0, Contact::Pickup(pickup), &host_pose),
        ContactOutcome::Ignored
    );
    arena.assert_converged();

    for peer in &arena.peers {
        assert_eq!(peer.participant.projectile(1).unwrap().power_ups().len(), 1);
        assert!(peer.participant.projectile(0).unwrap().power_ups().is_empty());
    }
    let guest = arena.peer(GUEST);
    assert_eq!(guest.participant.stats().power_ups_collected, 1);
    let log = guest.screen.log();
    assert!(log.banners.iter().any(|b| b.bottom.starts_with("Equipped:")));
    assert!(log.hud.as_ref().is_some_and(|h| !h.power_ups.is_empty()));
    assert!(log.locomotion.is_some());
}

#[test]
fn practice_target_hops_for_everyone() {
    let mut arena = Arena::new(2);
    arena.join(HOST);
    arena.join(GUEST);
    let before = arena.peer(GUEST).participant.target(0).unwrap().state().marker;

    let pose = arena.peer(GUEST).pose;
    let guest = &mut arena.peer_mut(GUEST).participant;
    guest.grip(1, None);
    guest.release(1, Vec3::new(0.0, 0.0, 8.0), pose.forward);
    assert_eq!(
        guest.contact(1, Contact::Target(0), &pose),
        ContactOutcome::TargetStruck { target: 0 }
    );
    arena.pump();

    for peer in &arena.peers {
        let state = peer.participant.target(0).unwrap().state();
        assert_eq!(state.hits, 1);
        assert_ne!(state.marker, before);
    }
    assert_eq!(arena.peer(GUEST).participant.stats().targets_hit, 1);
}

#[test]
fn departure_mid_round_keeps_fighting() {
    let mut arena = fighting_pair();
    arena.peer_mut(HOST).participant.player_left(GUEST);
    arena.pump();
    arena.run_for(2_000);

    assert_eq!(arena.phase(), Phase::Fighting);
    arena.assert_converged();
    assert!(!arena.peer(GUEST).participant.session().is_joined(GUEST));
    assert_eq!(arena.table.owner_of(ObjectId::Projectile(1)), Some(HOST));
    assert!(arena.peer(GUEST).participant.local_projectile().is_none());
}
