use super::input::MovementIntent;
use super::Game;

/// Executes the phases of one tick, in order:
/// physics step -> visual sync -> player control -> animation -> camera.
///
/// The controller runs after sync so it reads post-step body state, and the
/// camera reads the controller's written-back visual position.
pub(super) fn run_tick_phases(game: &mut Game, dt: f32, intent: &MovementIntent) {
    // Step physics and copy body transforms onto their visuals.
    game.registry
        .step_and_sync(&mut game.physics, &mut game.scene, dt);

    // Player control and animation only run once the character is ready.
    if let (Some(rig), Some(animator)) = (game.player.as_mut(), game.animator.as_mut()) {
        game.last_report = game
            .controller
            .update(intent, &mut game.physics, &mut game.scene, rig);

        let transition = animator.advance(intent, dt);
        log::trace!("[Tick {}] animation {:?}", game.tick, transition);

        if let Some(node) = game.scene.get(rig.node) {
            game.camera.follow(node.position);
        }
    }

    game.tick += 1;
}
