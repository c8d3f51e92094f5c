use std::time::Duration;

use harvest_engine::{InputSnapshot, PoolHandle, Vec2};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::combat::OverlapPair;
use super::config::RunConfig;
use super::entities::PickupKind;
use super::events::RunEvent;
use super::profile::{Account, MemoryStore, PROFILE_KEY};
use super::run::RunSimulation;
use super::state::RunPhase;

const STEP: Duration = Duration::from_millis(100);
const FAR_CORNER: Vec2 = Vec2::new(1200.0, 680.0);

/// No waves, no courier rolls, no projectiles: only what a test places.
fn quiet_config() -> RunConfig {
    let mut config = RunConfig::default();
    config.enemy.spawn_interval_ms = 3_600_000;
    config.courier.roll_interval_ms = 3_600_000;
    config.projectile.pool_size = 0;
    config
}

fn start_run(config: RunConfig) -> RunSimulation {
    start_run_with_store(config, MemoryStore::default())
}

fn start_run_with_store(config: RunConfig, store: MemoryStore) -> RunSimulation {
    let account = Account::open(Box::new(store));
    RunSimulation::start(config, account, StdRng::seed_from_u64(7))
}

fn run_ticks(run: &mut RunSimulation, count: usize) {
    for _ in 0..count {
        run.tick(STEP, &InputSnapshot::empty());
    }
}

fn place_enemy(run: &mut RunSimulation, position: Vec2, health: u32) -> PoolHandle {
    let world = run.world_mut();
    let handle = world.enemies.acquire(position).expect("enemy slot");
    if let Some(enemy) = world.enemies.get_mut(handle) {
        enemy.arm(health, 0.0);
    }
    handle
}

fn place_projectile(run: &mut RunSimulation, damage: u32) -> PoolHandle {
    let world = run.world_mut();
    let handle = world.projectiles.acquire(FAR_CORNER).expect("projectile slot");
    if let Some(projectile) = world.projectiles.get_mut(handle) {
        projectile.launch(damage, Vec2::ZERO, None);
    }
    handle
}

fn open_portal(run: &mut RunSimulation) {
    let opened = run.with_context(|ctx, _, spawner| spawner.open_portal(ctx));
    assert!(opened);
}

fn grant_xp(run: &mut RunSimulation, amount: u32) {
    run.with_context(|ctx, progression, spawner| {
        progression.add_xp(ctx, spawner, amount);
    });
}

#[test]
fn enemy_pool_never_exceeds_capacity_under_spawn_pressure() {
    let mut config = quiet_config();
    config.enemy.pool_size = 5;
    config.enemy.spawn_interval_ms = 10;
    config.enemy.speed = 0.0;
    let mut run = start_run(config);

    for _ in 0..50 {
        run.tick(STEP, &InputSnapshot::empty());
        assert!(run.world().enemies.active_count() <= 5);
    }
    assert_eq!(run.world().enemies.active_count(), 5);
    assert_eq!(run.phase(), RunPhase::Active);
}

#[test]
fn banking_moves_gold_once_and_then_is_a_no_op() {
    let mut run = start_run(quiet_config());
    run.state_mut().temp_gold = 50;
    let courier = run.world_mut().couriers.acquire(FAR_CORNER).expect("courier");

    run.resolve_overlaps(&[OverlapPair::PlayerCourier { courier }]);

    assert_eq!(run.account().profile().total_gold, 50);
    assert_eq!(run.state().temp_gold, 0);
    assert!(!run.world().couriers.is_live(courier));
    assert_eq!(run.account().write_count(), 1);

    run.resolve_overlaps(&[OverlapPair::PlayerCourier { courier }]);
    assert_eq!(run.account().profile().total_gold, 50);
    assert_eq!(run.account().write_count(), 1);
}

#[test]
fn courier_with_empty_wallet_stays_and_writes_nothing() {
    let mut run = start_run(quiet_config());
    let courier = run.world_mut().couriers.acquire(FAR_CORNER).expect("courier");

    run.resolve_overlaps(&[OverlapPair::PlayerCourier { courier }]);

    assert!(run.world().couriers.is_live(courier));
    assert_eq!(run.account().write_count(), 0);
}

#[test]
fn extraction_settles_once_and_ends_the_run() {
    let mut run = start_run(quiet_config());
    open_portal(&mut run);
    let portal = run.world().active_portal().expect("portal").0;
    {
        let state = run.state_mut();
        state.temp_gold = 40;
        state.collected_shards = 2;
        state.level = 3;
    }

    run.resolve_overlaps(&[OverlapPair::PlayerPortal { portal }]);

    let profile = run.account().profile();
    assert_eq!(run.phase(), RunPhase::Extracted);
    assert_eq!(profile.total_gold, 40);
    assert_eq!(profile.blood_shards, 2);
    assert_eq!(profile.meta_xp, 300);
    assert_eq!(run.account().write_count(), 1);
    assert_eq!(run.pending_task_count(), 0);

    run.resolve_overlaps(&[OverlapPair::PlayerPortal { portal }]);
    assert_eq!(run.account().write_count(), 1);
    assert_eq!(run.account().profile().total_gold, 40);
}

#[test]
fn extraction_requires_an_open_portal() {
    let mut run = start_run(quiet_config());
    let portal = run.world_mut().portals.acquire(FAR_CORNER).expect("portal body");
    run.state_mut().temp_gold = 10;

    run.resolve_overlaps(&[OverlapPair::PlayerPortal { portal }]);

    assert_eq!(run.phase(), RunPhase::Active);
    assert_eq!(run.account().write_count(), 0);
}

#[test]
fn extraction_meta_xp_cascades_account_levels() {
    let store = MemoryStore::with_record(
        PROFILE_KEY,
        r#"{ "metaXp": 900, "accountLevel": 1 }"#,
    );
    let mut run = start_run_with_store(quiet_config(), store);
    open_portal(&mut run);
    let portal = run.world().active_portal().expect("portal").0;
    run.state_mut().level = 30;

    run.resolve_overlaps(&[OverlapPair::PlayerPortal { portal }]);

    // 900 + 3000 pays for level 1 (1000) and level 2 (2000).
    let profile = run.account().profile();
    assert_eq!(profile.account_level, 3);
    assert_eq!(profile.meta_xp, 900);
}

#[test]
fn death_keeps_shards_and_forfeits_gold() {
    let store = MemoryStore::with_record(PROFILE_KEY, r#"{ "totalGold": 100 }"#);
    let mut run = start_run_with_store(quiet_config(), store);
    {
        let state = run.state_mut();
        state.temp_gold = 30;
        state.collected_shards = 4;
        state.health = 10;
    }
    let enemy = place_enemy(&mut run, FAR_CORNER, 30);

    run.resolve_overlaps(&[OverlapPair::PlayerEnemy { enemy }]);

    let profile = run.account().profile();
    assert_eq!(run.phase(), RunPhase::GameOver);
    assert_eq!(profile.blood_shards, 4);
    assert_eq!(profile.total_gold, 100);
    assert_eq!(run.account().write_count(), 1);
    assert_eq!(run.pending_task_count(), 0);
}

#[test]
fn nothing_changes_after_the_run_ends() {
    let mut config = quiet_config();
    config.enemy.spawn_interval_ms = 100;
    let mut run = start_run(config);
    run.state_mut().health = 10;
    let enemy = place_enemy(&mut run, FAR_CORNER, 30);
    run.resolve_overlaps(&[OverlapPair::PlayerEnemy { enemy }]);
    assert_eq!(run.phase(), RunPhase::GameOver);

    let state_before = run.state().clone();
    let enemies_before = run.world().enemies.active_count();
    let elapsed_before = run.elapsed();
    let writes_before = run.account().write_count();

    run_ticks(&mut run, 50);
    let late_enemy = place_enemy(&mut run, FAR_CORNER, 30);
    run.resolve_overlaps(&[OverlapPair::PlayerEnemy { enemy: late_enemy }]);

    assert_eq!(run.state(), &state_before);
    assert_eq!(run.world().enemies.active_count(), enemies_before + 1);
    assert_eq!(run.elapsed(), elapsed_before);
    assert_eq!(run.account().write_count(), writes_before);
    assert!(run.last_tick_events().is_empty());
}

#[test]
fn invulnerability_blocks_contact_damage_for_one_second() {
    let mut run = start_run(quiet_config());
    let first = place_enemy(&mut run, FAR_CORNER, 30);
    let second = place_enemy(&mut run, FAR_CORNER - Vec2::new(100.0, 0.0), 30);

    run.resolve_overlaps(&[OverlapPair::PlayerEnemy { enemy: first }]);
    assert_eq!(run.state().health, 90);
    assert!(run.state().invulnerable);
    assert!(!run.world().enemies.is_live(first));

    run.resolve_overlaps(&[OverlapPair::PlayerEnemy { enemy: second }]);
    assert_eq!(run.state().health, 90);
    assert!(run.world().enemies.is_live(second));

    run_ticks(&mut run, 9);
    assert!(run.state().invulnerable);
    run_ticks(&mut run, 1);
    assert!(!run.state().invulnerable);

    run.resolve_overlaps(&[OverlapPair::PlayerEnemy { enemy: second }]);
    assert_eq!(run.state().health, 80);
}

#[test]
fn a_projectile_hits_at_most_once() {
    let mut run = start_run({
        let mut config = quiet_config();
        config.projectile.pool_size = 4;
        config
    });
    let enemy = place_enemy(&mut run, FAR_CORNER, 30);
    let projectile = place_projectile(&mut run, 15);

    run.resolve_overlaps(&[
        OverlapPair::ProjectileEnemy { projectile, enemy },
        OverlapPair::ProjectileEnemy { projectile, enemy },
    ]);

    assert_eq!(run.world().enemies.get(enemy).map(|e| e.health), Some(15));
    assert!(!run.world().projectiles.is_live(projectile));
}

#[test]
fn enemy_death_drops_one_xp_orb_and_dies_once() {
    let mut run = start_run({
        let mut config = quiet_config();
        config.projectile.pool_size = 4;
        config.loot.gold_chance = 0.0;
        config.loot.shard_chance = 0.0;
        config
    });
    let enemy = place_enemy(&mut run, FAR_CORNER, 30);
    let first = place_projectile(&mut run, 30);
    let second = place_projectile(&mut run, 30);

    run.resolve_overlaps(&[
        OverlapPair::ProjectileEnemy {
            projectile: first,
            enemy,
        },
        OverlapPair::ProjectileEnemy {
            projectile: second,
            enemy,
        },
    ]);

    assert!(!run.world().enemies.is_live(enemy));
    assert!(run.world().projectiles.is_live(second));
    let orbs: Vec<_> = run.world().pickups.xp_orbs.iter_active().collect();
    assert_eq!(orbs.len(), 1);
    assert_eq!(orbs[0].1.position, FAR_CORNER);
    assert_eq!(orbs[0].1.value, 10);
    assert_eq!(run.world().pickups.gold_coins.active_count(), 0);
}

#[test]
fn guaranteed_loot_drops_all_three_pickups() {
    let mut run = start_run({
        let mut config = quiet_config();
        config.projectile.pool_size = 1;
        config.loot.gold_chance = 1.0;
        config.loot.shard_chance = 1.0;
        config
    });
    let enemy = place_enemy(&mut run, FAR_CORNER, 10);
    let projectile = place_projectile(&mut run, 10);

    run.resolve_overlaps(&[OverlapPair::ProjectileEnemy { projectile, enemy }]);

    let pickups = &run.world().pickups;
    assert_eq!(pickups.xp_orbs.active_count(), 1);
    assert_eq!(pickups.gold_coins.active_count(), 1);
    assert_eq!(pickups.blood_shards.active_count(), 1);
    let gold = pickups
        .gold_coins
        .iter_active()
        .map(|(_, coin)| coin.value)
        .next()
        .expect("coin");
    assert!((5..=15).contains(&gold));
}

#[test]
fn pickups_route_to_wallet_and_progression() {
    let mut run = start_run(quiet_config());
    let position = FAR_CORNER;
    let world = run.world_mut();
    let coin = world
        .pickups
        .drop_at(PickupKind::GoldCoin, position, 12)
        .expect("coin");
    let shard = world
        .pickups
        .drop_at(PickupKind::BloodShard, position, 1)
        .expect("shard");
    let orb = world
        .pickups
        .drop_at(PickupKind::XpOrb, position, 10)
        .expect("orb");

    run.resolve_overlaps(&[
        OverlapPair::PlayerPickup {
            kind: PickupKind::GoldCoin,
            pickup: coin,
        },
        OverlapPair::PlayerPickup {
            kind: PickupKind::BloodShard,
            pickup: shard,
        },
        OverlapPair::PlayerPickup {
            kind: PickupKind::XpOrb,
            pickup: orb,
        },
        OverlapPair::PlayerPickup {
            kind: PickupKind::GoldCoin,
            pickup: coin,
        },
    ]);

    assert_eq!(run.state().temp_gold, 12);
    assert_eq!(run.state().collected_shards, 1);
    assert_eq!(run.state().current_xp, 10);
    assert_eq!(run.account().write_count(), 0);
}

#[test]
fn level_up_pauses_until_an_upgrade_is_chosen() {
    let mut run = start_run(quiet_config());

    grant_xp(&mut run, 100);

    assert_eq!(run.state().level, 2);
    assert_eq!(run.state().required_xp, 150);
    assert_eq!(run.phase(), RunPhase::Paused);
    assert_eq!(run.upgrade_options().len(), 3);
    assert_eq!(run.hud().upgrade_options.len(), 3);

    let elapsed = run.elapsed();
    run_ticks(&mut run, 20);
    assert_eq!(run.elapsed(), elapsed);
    assert_eq!(run.phase(), RunPhase::Paused);

    assert!(run.choose_upgrade(7).is_none());
    assert_eq!(run.phase(), RunPhase::Paused);

    let expected = run.upgrade_options()[0];
    run.tick(STEP, &InputSnapshot::empty().with_upgrade_choice(Some(0)));
    assert_eq!(run.phase(), RunPhase::Active);
    assert!(run.upgrade_options().is_empty());
    assert!(run
        .last_tick_events()
        .contains(&RunEvent::UpgradeApplied { upgrade: expected }));
    assert!(run.elapsed() > elapsed);
}

#[test]
fn one_level_per_grant_even_with_surplus() {
    let mut run = start_run(quiet_config());

    grant_xp(&mut run, 1000);

    assert_eq!(run.state().level, 2);
    assert_eq!(run.state().current_xp, 900);
    assert_eq!(run.state().required_xp, 150);
}

#[test]
fn reaching_level_three_opens_the_portal_once() {
    let mut run = start_run(quiet_config());

    grant_xp(&mut run, 100);
    run.choose_upgrade(0).expect("upgrade");
    assert!(!run.state().portal_active);

    grant_xp(&mut run, 150);
    assert_eq!(run.state().level, 3);
    assert!(run.state().portal_active);
    assert!(run.world().active_portal().is_some());

    run.choose_upgrade(0).expect("upgrade");
    grant_xp(&mut run, 225);
    assert_eq!(run.state().level, 4);
    assert_eq!(run.world().portals.active_count(), 1);
}

#[test]
fn auto_fire_targets_nearest_enemy_and_reloads() {
    let mut config = quiet_config();
    config.projectile.pool_size = 30;
    let mut run = start_run(config);
    let far = place_enemy(&mut run, FAR_CORNER, 1000);
    let near = place_enemy(&mut run, Vec2::new(900.0, 360.0), 1000);
    run.state_mut().ammo = 1;

    // Rusty Sword: fires every 800 ms, reloads in 1500 ms.
    run_ticks(&mut run, 8);
    let fired: Vec<_> = run
        .last_tick_events()
        .iter()
        .filter_map(|event| match event {
            RunEvent::ProjectileFired { target, .. } => Some(*target),
            _ => None,
        })
        .collect();
    assert_eq!(fired, vec![near]);
    assert_ne!(fired[0], far);
    assert_eq!(run.state().ammo, 0);
    assert!(run.state().reloading);

    run_ticks(&mut run, 14);
    assert!(run.state().reloading);
    run_ticks(&mut run, 1);
    assert!(!run.state().reloading);
    assert_eq!(run.state().ammo, run.state().max_ammo);
}

#[test]
fn passive_heal_restores_health_with_heal_ability() {
    let store = MemoryStore::with_record(
        PROFILE_KEY,
        r#"{ "currentLoadout": { "weapon": "Rusty Sword", "ability": "Heal" } }"#,
    );
    let mut run = start_run_with_store(quiet_config(), store);
    run.state_mut().health = 50;

    run_ticks(&mut run, 29);
    assert_eq!(run.state().health, 50);
    run_ticks(&mut run, 1);
    assert_eq!(run.state().health, 52);
}

#[test]
fn courier_leaves_after_its_lifespan() {
    let mut config = quiet_config();
    config.courier.roll_interval_ms = 1000;
    config.courier.spawn_chance = 1.0;
    config.courier.lifespan_ms = 3000;
    let mut run = start_run(config);

    run_ticks(&mut run, 10);
    assert!(run.world().active_courier().is_some());

    run_ticks(&mut run, 29);
    assert!(run.world().active_courier().is_some());
    run_ticks(&mut run, 1);
    assert!(run.world().active_courier().is_none());
    assert!(run.last_tick_events().contains(&RunEvent::CourierLeft));
}

#[test]
fn corrupt_profile_still_starts_a_run_with_defaults() {
    let store = MemoryStore::with_record(PROFILE_KEY, "\u{0}garbage");
    let run = start_run_with_store(quiet_config(), store);

    assert_eq!(run.loadout().weapon.name, "Rusty Sword");
    assert_eq!(run.state().max_ammo, 12);
    assert_eq!(run.account().profile().account_level, 1);
}

#[test]
fn locked_loadout_weapon_is_clamped_to_first_unlocked() {
    let store = MemoryStore::with_record(
        PROFILE_KEY,
        r#"{
            "unlockedWeapons": ["Hunting Crossbow"],
            "currentLoadout": { "weapon": "Rusty Sword", "ability": "Sprint" }
        }"#,
    );
    let run = start_run_with_store(quiet_config(), store);

    assert_eq!(run.loadout().weapon.name, "Hunting Crossbow");
    assert_eq!(run.state().max_ammo, 6);
}

#[test]
fn seeded_runs_are_deterministic() {
    let mut config = RunConfig::default();
    config.courier.roll_interval_ms = 5_000;

    let mut first = start_run(config.clone());
    let mut second = start_run(config);
    for _ in 0..600 {
        first.tick(STEP, &InputSnapshot::empty().with_upgrade_choice(Some(0)));
        second.tick(STEP, &InputSnapshot::empty().with_upgrade_choice(Some(0)));
    }

    assert_eq!(first.state(), second.state());
    assert_eq!(first.world().player.position, second.world().player.position);
    assert_eq!(
        first.world().enemies.active_count(),
        second.world().enemies.active_count()
    );
}

#[test]
fn default_run_spawns_waves_and_kills_enemies() {
    let mut run = start_run(RunConfig::default());
    let mut kills = 0;
    for _ in 0..300 {
        run.tick(STEP, &InputSnapshot::empty().with_upgrade_choice(Some(0)));
        kills += run.last_tick_counts().enemies_killed;
        if run.phase().is_terminal() {
            break;
        }
    }

    assert!(kills > 0);
}
