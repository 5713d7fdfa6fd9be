//! End-to-end scenarios for enemies and the spawner.
//!
//! These drive whole enemies and spawners through many ticks and check the
//! observable outcomes rather than individual transitions.

#![cfg(test)]

use glam::Vec2;
use proptest::prelude::*;
use skirmish_common::{EnemyId, SpawnPointId};
use std::collections::HashSet;

use crate::backend::{CircleObstacles, KinematicBackend, KinematicBody};
use crate::combatant::MockTarget;
use crate::config::SpawnerConfig;
use crate::drops::{DropRule, DropTable, ItemDef};
use crate::enemy::{EnemyController, EnemyState};
use crate::events::EventBus;
use crate::patrol::PatrolController;
use crate::rng::SimRng;
use crate::spawn_point::{RespawnPolicy, SpawnPoint};
use crate::spawner::EnemySpawner;

const DT: f32 = 1.0 / 60.0;

fn lone_enemy(bus: &EventBus, seed: u64) -> EnemyController {
    EnemyController::new(
        EnemyId::from_raw(1),
        Box::new(KinematicBody::new(Vec2::ZERO)),
        bus.sender(),
        SimRng::new(seed),
    )
}

fn spawner(config: SpawnerConfig) -> EnemySpawner {
    EnemySpawner::new(
        config,
        Box::new(KinematicBackend::default()),
        Box::new(CircleObstacles::new()),
    )
}

/// Decision by distance and cooldown
mod decision_scenarios {
    use super::*;

    #[test]
    fn e2e_out_of_detection_range_stays_idle() {
        let bus = EventBus::default();
        let mut e = lone_enemy(&bus, 1);
        let mut target = MockTarget::new(Vec2::new(10.0, 0.0));

        for _ in 0..30 {
            e.update(DT, Some(&mut target));
            assert_eq!(e.state(), EnemyState::Idle);
            assert_eq!(e.movement(), Vec2::ZERO);
        }
    }

    #[test]
    fn e2e_out_of_detection_range_with_patrol_patrols() {
        let bus = EventBus::default();
        let mut e = lone_enemy(&bus, 1);
        let mut rng = SimRng::new(9);
        e.start_patrolling(PatrolController::generate(Vec2::ZERO, 3.0, &mut rng));
        let mut target = MockTarget::new(Vec2::new(10.0, 0.0));

        e.update(DT, Some(&mut target));
        assert_eq!(e.state(), EnemyState::Patrol);
    }

    #[test]
    fn e2e_mid_range_approaches_in_a_straight_line() {
        let bus = EventBus::default();
        let mut e = lone_enemy(&bus, 2);
        let mut tuning = *e.tuning();
        tuning.retreat.enabled = false;
        e = e.with_tuning(tuning);
        let mut target = MockTarget::new(Vec2::new(3.0, 0.0));

        e.update(DT, Some(&mut target));
        assert_eq!(e.state(), EnemyState::Approach);
        assert!((e.movement() - Vec2::X).length() < 1e-5);
        assert!((e.movement().length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn e2e_attack_in_band_then_cooldown_is_exact() {
        let bus = EventBus::default();
        let mut e = lone_enemy(&bus, 3);
        let mut target = MockTarget::new(Vec2::new(1.2, 0.0));

        e.update(DT, Some(&mut target));
        assert_eq!(e.state(), EnemyState::Attack);

        while e.is_attacking() {
            e.update(DT, Some(&mut target));
        }
        assert_eq!(e.attack_timer(), e.tuning().movement.attack_cooldown);
        assert_eq!(target.hits.len(), 1);
    }

    #[test]
    fn e2e_target_dies_mid_wind_up() {
        let bus = EventBus::default();
        let mut e = lone_enemy(&bus, 4);
        let mut rng = SimRng::new(4);
        e.start_patrolling(PatrolController::generate(Vec2::ZERO, 3.0, &mut rng));
        let mut target = MockTarget::new(Vec2::new(1.2, 0.0));

        e.update(DT, Some(&mut target));
        assert!(e.is_attacking());

        for _ in 0..5 {
            e.update(DT, Some(&mut target));
        }
        target.kill();
        e.update(DT, Some(&mut target));

        assert!(!e.is_attacking());
        assert_eq!(e.state(), EnemyState::Patrol);
        assert_eq!(e.attack_timer(), e.tuning().movement.attack_cooldown);

        for _ in 0..120 {
            e.update(DT, Some(&mut target));
        }
        assert!(target.hits.is_empty());
    }
}

/// Interrupt gating and death
mod interrupt_scenarios {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_interrupts_gate_evaluation(
            seed in any::<u64>(),
            distance in 1.0f32..1.5,
            hits in proptest::collection::vec(0usize..240, 0..6),
        ) {
            let bus = EventBus::default();
            let mut e = lone_enemy(&bus, seed);
            let mut target = MockTarget::new(Vec2::new(distance, 0.0)).with_health(10_000);

            for tick in 0..240 {
                if hits.contains(&tick) {
                    let _ = e.take_damage(1, Vec2::Y);
                }

                let hurt_before = e.is_hurt();
                let attacking_before = e.is_attacking();
                let before = e.evaluation_count();
                e.update(DT, Some(&mut target));
                let evaluated = e.evaluation_count() > before;

                if hurt_before && e.is_hurt() {
                    prop_assert!(!evaluated, "evaluated while hurt at tick {}", tick);
                }
                if attacking_before && e.is_attacking() {
                    prop_assert!(!evaluated, "evaluated mid-attack at tick {}", tick);
                }
            }
        }

        #[test]
        fn prop_death_is_final(seed in any::<u64>(), extra_hits in 0usize..5) {
            let bus = EventBus::default();
            let mut e = lone_enemy(&bus, seed);
            let mut target = MockTarget::new(Vec2::new(1.2, 0.0));

            let _ = e.take_damage(1_000, Vec2::X);
            prop_assert!(e.is_dead());
            for _ in 0..extra_hits {
                let _ = e.take_damage(1_000, Vec2::X);
            }
            for _ in 0..120 {
                e.update(DT, Some(&mut target));
                e.fixed_update(DT);
                prop_assert!(e.is_dead());
                prop_assert!(!e.is_attacking());
            }
            prop_assert!(target.hits.is_empty());

            let died = bus
                .drain()
                .into_iter()
                .filter(|event| matches!(event, crate::events::EnemyEvent::Died { .. }))
                .count();
            prop_assert_eq!(died, 1);
        }
    }
}

/// Respawn queue timing
mod respawn_scenarios {
    use super::*;

    fn single_point(delay: f32, variation: f32) -> SpawnerConfig {
        SpawnerConfig {
            spawn_points: vec![SpawnPoint::new("Gate", Vec2::new(8.0, 0.0))
                .with_max_enemies(1)
                .with_respawn(RespawnPolicy::new(delay, variation))],
            total_enemies: 1,
            ..Default::default()
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn prop_respawn_never_early_never_late(
            delay in 0.1f32..3.0,
            variation in 0.0f32..1.0,
            seed in any::<u64>(),
        ) {
            let mut s = spawner(SpawnerConfig {
                seed,
                ..single_point(delay, variation)
            });
            prop_assert_eq!(s.start(), 1);
            let first = s.enemies()[0].id();
            let _ = s.enemy_mut(first).map(|e| e.take_damage(10_000, Vec2::X));

            let drain_interval = s.config().drain_interval;
            let mut ready_at = None;
            let mut respawned_at = None;
            for _ in 0..600 {
                s.update(DT, None);
                if ready_at.is_none() {
                    ready_at = s.pending_requests().next().map(|r| r.ready_at);
                }
                if s.enemies().iter().any(|e| e.id() != first) {
                    respawned_at = Some(s.clock());
                    break;
                }
            }

            let ready_at = ready_at.expect("respawn was queued");
            let respawned_at = respawned_at.expect("enemy respawned");
            prop_assert!(respawned_at >= ready_at, "spawned early: {} < {}", respawned_at, ready_at);
            prop_assert!(
                respawned_at <= ready_at + drain_interval + DT + 1e-3,
                "spawned late: {} > {}",
                respawned_at,
                ready_at + drain_interval
            );
        }
    }

    #[test]
    fn e2e_respawn_waits_for_room() {
        let mut s = spawner(SpawnerConfig {
            total_enemies: 2,
            spawn_points: vec![SpawnPoint::new("Gate", Vec2::new(8.0, 0.0))
                .with_max_enemies(2)
                .with_respawn(RespawnPolicy::new(0.2, 0.0))],
            ..Default::default()
        });
        assert_eq!(s.start(), 2);
        let gate = SpawnPointId::new(0);

        let victim = s.enemies()[0].id();
        let _ = s.enemy_mut(victim).map(|e| e.take_damage(10_000, Vec2::X));
        for _ in 0..70 {
            s.update(DT, None);
        }
        assert_eq!(s.live_count(gate), 1);

        s.registry_mut()
            .get_mut(gate)
            .expect("gate registered")
            .set_max_enemies(1);
        for _ in 0..120 {
            s.update(DT, None);
        }
        assert_eq!(s.live_count(gate), 1);
        assert_eq!(s.pending_respawn_count(), 1);

        s.registry_mut()
            .get_mut(gate)
            .expect("gate registered")
            .set_max_enemies(2);
        for _ in 0..120 {
            s.update(DT, None);
        }
        assert_eq!(s.live_count(gate), 2);
        assert_eq!(s.pending_respawn_count(), 0);
    }

    #[test]
    fn e2e_global_cap_holds_respawn_until_a_death_frees_room() {
        let mut s = spawner(SpawnerConfig {
            total_enemies: 1,
            spawn_points: vec![
                SpawnPoint::new("Gate", Vec2::new(8.0, 0.0))
                    .with_max_enemies(1)
                    .with_respawn(RespawnPolicy::new(0.2, 0.0)),
                SpawnPoint::new("Camp", Vec2::new(-8.0, 0.0))
                    .with_max_enemies(1)
                    .with_respawn(RespawnPolicy {
                        enabled: false,
                        ..RespawnPolicy::new(1.0, 0.0)
                    }),
            ],
            ..Default::default()
        });
        let gate = SpawnPointId::new(0);
        let camp = SpawnPointId::new(1);
        assert_eq!(s.start(), 1);
        assert_eq!(s.live_count(gate), 1);

        let victim = s.enemies()[0].id();
        let _ = s.enemy_mut(victim).map(|e| e.take_damage(10_000, Vec2::X));
        let blocker = s.spawn_at_point(camp).expect("camp has room");

        for _ in 0..180 {
            s.update(DT, None);
        }
        assert_eq!(s.live_count(gate), 0, "respawned past the global cap");
        assert_eq!(s.active_enemy_count(), 1);
        assert_eq!(s.pending_respawn_count(), 1);

        let _ = s.enemy_mut(blocker).map(|e| e.take_damage(10_000, Vec2::X));
        for _ in 0..180 {
            s.update(DT, None);
        }
        assert_eq!(s.live_count(gate), 1);
        assert_eq!(s.live_count(camp), 0);
        assert_eq!(s.pending_respawn_count(), 0);
    }

    #[test]
    fn e2e_blocked_head_does_not_hold_back_later_requests() {
        let mut s = spawner(SpawnerConfig {
            total_enemies: 2,
            spawn_points: vec![
                SpawnPoint::new("Gate", Vec2::new(8.0, 0.0))
                    .with_max_enemies(1)
                    .with_respawn(RespawnPolicy::new(0.2, 0.0)),
                SpawnPoint::new("Camp", Vec2::new(-8.0, 0.0))
                    .with_max_enemies(1)
                    .with_respawn(RespawnPolicy::new(0.4, 0.0)),
            ],
            ..Default::default()
        });
        let gate = SpawnPointId::new(0);
        let camp = SpawnPointId::new(1);
        assert_eq!(s.start(), 2);

        let ids: Vec<EnemyId> = s.enemies().iter().map(EnemyController::id).collect();
        for id in ids {
            let _ = s.enemy_mut(id).map(|e| e.take_damage(10_000, Vec2::X));
        }
        s.registry_mut()
            .get_mut(gate)
            .expect("gate registered")
            .set_enabled(false);

        for _ in 0..70 {
            s.update(DT, None);
        }
        let queued: Vec<SpawnPointId> = s.pending_requests().map(|r| r.origin).collect();
        assert_eq!(queued, vec![gate, camp]);

        for _ in 0..120 {
            s.update(DT, None);
        }
        assert_eq!(s.live_count(gate), 0);
        assert_eq!(s.live_count(camp), 1);
        assert_eq!(s.pending_respawn_count(), 1);
        assert_eq!(s.pending_requests().next().map(|r| r.origin), Some(gate));
    }
}

/// Drops flowing out of the spawner
mod drop_scenarios {
    use super::*;

    fn with_drops(drops: DropTable) -> EnemySpawner {
        spawner(SpawnerConfig {
            spawn_points: vec![SpawnPoint::new("Den", Vec2::new(0.0, 10.0)).with_max_enemies(1)],
            total_enemies: 1,
            drops,
            ..Default::default()
        })
    }

    #[test]
    fn e2e_certain_drop_always_reaches_caller() {
        let table = DropTable::new(1.0)
            .with_rule(DropRule::new(ItemDef::new(7, "Fang").with_drop_chance(1.0)));
        for _ in 0..20 {
            let mut s = with_drops(table.clone());
            s.start();
            let id = s.enemies()[0].id();
            let _ = s.enemy_mut(id).map(|e| e.take_damage(10_000, Vec2::X));
            s.update(DT, None);

            let drops = s.drain_drops();
            assert!(!drops.is_empty());
            assert!(drops.iter().all(|d| d.item.raw() == 7 && d.name == "Fang"));
            assert!(s.drain_drops().is_empty());
        }
    }

    #[test]
    fn e2e_zero_base_chance_never_drops() {
        let table = DropTable::new(0.0)
            .with_rule(DropRule::new(ItemDef::new(7, "Fang").with_drop_chance(1.0)));
        let mut s = with_drops(table);
        s.start();
        let id = s.enemies()[0].id();
        let _ = s.enemy_mut(id).map(|e| e.take_damage(10_000, Vec2::X));
        for _ in 0..10 {
            s.update(DT, None);
        }
        assert!(s.drain_drops().is_empty());
    }
}

/// A full arena run with fighting and respawning
mod arena_scenarios {
    use super::*;

    #[test]
    fn e2e_arena_keeps_bookkeeping_consistent() {
        let config = SpawnerConfig {
            spawn_points: vec![
                SpawnPoint::new("West", Vec2::new(-6.0, 0.0)).with_max_enemies(2),
                SpawnPoint::new("East", Vec2::new(6.0, 0.0))
                    .with_max_enemies(3)
                    .with_respawn(RespawnPolicy::new(1.0, 0.0)),
            ],
            total_enemies: 4,
            ..Default::default()
        };
        let capacities = [2, 3];
        let total = config.total_enemies as usize;

        let mut s = spawner(config);
        let mut player = MockTarget::new(Vec2::ZERO).with_health(100_000);
        s.set_player_position(Some(player.position));
        assert_eq!(s.start(), 4);

        let mut seen: HashSet<EnemyId> = s.enemies().iter().map(EnemyController::id).collect();
        let mut kills = 0;

        for tick in 0..(60 * 20) {
            s.update(DT, Some(&mut player));
            s.fixed_update(DT);

            if tick % 180 == 179 {
                if let Some(enemy) = s.enemies_mut().iter_mut().rev().find(|e| !e.is_dead()) {
                    let _ = enemy.take_damage(10_000, Vec2::X);
                    kills += 1;
                }
            }

            assert!(s.active_enemy_count() <= total);
            for (index, capacity) in capacities.iter().enumerate() {
                let id = SpawnPointId::new(index as u32);
                let live = s.live_count(id);
                assert!(live <= *capacity, "{id} over capacity: {live}");
                let listed = s.enemies().iter().filter(|e| e.origin() == Some(id)).count();
                assert_eq!(live as usize, listed);
            }
            seen.extend(s.enemies().iter().map(EnemyController::id));
        }

        assert!(kills >= 5);
        assert!(seen.len() > 4, "nothing respawned");
        assert!(player.damage_taken() > 0, "enemies never landed a hit");
    }
}
