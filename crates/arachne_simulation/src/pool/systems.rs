//! Effect pool systems.

use bevy::prelude::*;

use super::{ClearEffectPools, EffectPools, PlayEffect, PlaySound};

/// Система: PlayEffect / PlaySound события → pool
///
/// Исчерпанный pool или неизвестный ключ: запрос отбрасывается (warning в логе).
pub fn play_requested_effects(
    mut pools: ResMut<EffectPools>,
    mut effect_events: EventReader<PlayEffect>,
    mut sound_events: EventReader<PlaySound>,
) {
    for event in effect_events.read() {
        pools.particles.play_at(&event.key, event.position, event.rotation);
    }

    for event in sound_events.read() {
        pools.sounds.play_at(&event.key, event.position, Quat::IDENTITY);
    }
}

/// Система: авто-возврат отработавших эффектов
pub fn tick_effect_pools(mut pools: ResMut<EffectPools>, time: Res<Time<Fixed>>) {
    let delta = time.delta_secs();
    let released = pools.particles.tick(delta) + pools.sounds.tick(delta);

    if released > 0 {
        crate::log(&format!("EffectPools: {} instances returned", released));
    }
}

/// Система: scene teardown
pub fn clear_effect_pools_on_request(
    mut pools: ResMut<EffectPools>,
    mut clear_events: EventReader<ClearEffectPools>,
) {
    if clear_events.read().count() == 0 {
        return;
    }

    let released = pools.clear_all();
    crate::log_info(&format!("EffectPools: cleared ({} instances forced back)", released));
}
