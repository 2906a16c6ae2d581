//! One-light-at-a-time iteration over the scene's lights.
//!
//! On [`LightIsolation::begin`] every light is disabled. Each step enables
//! exactly one light (forcing its owning object active), and the previous
//! light is disabled again with its object flag put back. When the
//! isolation ends, by [`LightIsolation::finish`] or by `Drop`, every light
//! gets its original flags back.

use crate::scene::Scene;
use crate::state::LightRegistry;

/// The light currently isolated, with read access to the scene it lives in.
///
/// The scene is only borrowed shared, so a body cannot re-enable other
/// lights or change the light list mid-iteration:
///
/// ```compile_fail
/// use texbake_core::{for_each_light, Scene};
///
/// let mut scene = Scene::new();
/// let _ = for_each_light::<(), _>(&mut scene, |light| {
///     light.scene().lights.clear();
///     Ok(())
/// });
/// ```
pub struct IsolatedLight<'s> {
    index: usize,
    scene: &'s Scene,
}

impl IsolatedLight<'_> {
    /// Index of the light in the scene's native order.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Display name of the light.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.scene.lights[self.index].name
    }

    /// The scene with only this light live.
    #[must_use]
    pub fn scene(&self) -> &Scene {
        self.scene
    }
}

/// Restartable, finite iteration that isolates each light in turn.
pub struct LightIsolation<'a> {
    scene: &'a mut Scene,
    snapshot: LightRegistry,
    current: Option<usize>,
    next: usize,
    finished: bool,
}

impl<'a> LightIsolation<'a> {
    /// Snapshots every light's flags and disables all lights.
    pub fn begin(scene: &'a mut Scene) -> Self {
        let snapshot = LightRegistry::capture(scene);
        for light in &mut scene.lights {
            light.enabled = false;
        }
        Self {
            scene,
            snapshot,
            current: None,
            next: 0,
            finished: false,
        }
    }

    /// Number of lights the iteration visits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    /// Returns true if the scene has no lights.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }

    /// The flags recorded when the isolation began.
    #[must_use]
    pub fn snapshot(&self) -> &LightRegistry {
        &self.snapshot
    }

    /// Releases the previous light and isolates the next one, in scene
    /// order. Returns `None` once every light has been visited.
    pub fn next_light(&mut self) -> Option<IsolatedLight<'_>> {
        self.release_current();
        if self.next >= self.snapshot.len() {
            return None;
        }
        let index = self.next;
        self.next += 1;

        let light = self.scene.lights.get_mut(index)?;
        light.enabled = true;
        light.object_active = true;
        self.current = Some(index);

        Some(IsolatedLight {
            index,
            scene: &*self.scene,
        })
    }

    /// Starts the iteration over from the first light.
    pub fn restart(&mut self) {
        self.release_current();
        self.next = 0;
    }

    /// Ends the isolation and restores every light's original flags.
    pub fn finish(mut self) {
        self.restore();
    }

    fn release_current(&mut self) {
        let Some(index) = self.current.take() else {
            return;
        };
        if let Some(light) = self.scene.lights.get_mut(index) {
            light.enabled = false;
            if let Some(record) = self.snapshot.get(index) {
                light.object_active = record.object_active;
            }
        }
    }

    fn restore(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.release_current();
        self.snapshot.restore(&mut *self.scene);
    }
}

impl Drop for LightIsolation<'_> {
    fn drop(&mut self) {
        self.restore();
    }
}

/// Runs `body` once per light with only that light live.
///
/// Iteration stops at the first error, which is returned after the lights
/// have been restored.
pub fn for_each_light<E, F>(scene: &mut Scene, mut body: F) -> Result<(), E>
where
    F: FnMut(&IsolatedLight<'_>) -> Result<(), E>,
{
    let mut isolation = LightIsolation::begin(scene);
    while let Some(light) = isolation.next_light() {
        body(&light)?;
    }
    isolation.finish();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::light::Light;
    use glam::Vec3;
    use proptest::prelude::*;

    fn scene_with_flags(flags: &[(bool, bool)]) -> Scene {
        let mut scene = Scene::new();
        for (i, &(enabled, object_active)) in flags.iter().enumerate() {
            let mut light = Light::directional(format!("L{i}"), Vec3::NEG_Y);
            light.enabled = enabled;
            light.object_active = object_active;
            scene.lights.push(light);
        }
        scene
    }

    fn flags(scene: &Scene) -> Vec<(bool, bool)> {
        scene
            .lights
            .iter()
            .map(|l| (l.enabled, l.object_active))
            .collect()
    }

    #[test]
    fn test_visits_lights_in_scene_order() {
        let mut scene = scene_with_flags(&[(true, true), (false, false), (true, false)]);
        let mut visited = Vec::new();
        for_each_light::<(), _>(&mut scene, |light| {
            visited.push(light.name().to_string());
            Ok(())
        })
        .unwrap();
        assert_eq!(visited, vec!["L0", "L1", "L2"]);
    }

    #[test]
    fn test_inactive_light_is_forced_live() {
        let mut scene = scene_with_flags(&[(false, false)]);
        for_each_light::<(), _>(&mut scene, |light| {
            assert!(light.scene().lights[0].is_live());
            Ok(())
        })
        .unwrap();
        assert_eq!(flags(&scene), vec![(false, false)]);
    }

    #[test]
    fn test_error_stops_and_restores() {
        let original = [(true, true), (true, false), (false, true)];
        let mut scene = scene_with_flags(&original);
        let mut calls = 0;
        let result = for_each_light(&mut scene, |light| {
            calls += 1;
            if light.index() == 1 {
                Err("boom")
            } else {
                Ok(())
            }
        });
        assert_eq!(result, Err("boom"));
        assert_eq!(calls, 2);
        assert_eq!(flags(&scene), original.to_vec());
    }

    #[test]
    fn test_restart() {
        let mut scene = scene_with_flags(&[(true, true), (true, true)]);
        let mut isolation = LightIsolation::begin(&mut scene);
        assert_eq!(isolation.next_light().map(|l| l.index()), Some(0));
        assert_eq!(isolation.next_light().map(|l| l.index()), Some(1));
        assert!(isolation.next_light().is_none());
        isolation.restart();
        assert_eq!(isolation.next_light().map(|l| l.index()), Some(0));
        isolation.finish();
        assert_eq!(flags(&scene), vec![(true, true), (true, true)]);
    }

    #[test]
    fn test_empty_scene() {
        let mut scene = Scene::new();
        let mut calls = 0;
        for_each_light::<(), _>(&mut scene, |_| {
            calls += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(calls, 0);
    }

    proptest! {
        #[test]
        fn exactly_one_light_enabled_per_step(
            original in proptest::collection::vec((any::<bool>(), any::<bool>()), 0..8)
        ) {
            let mut scene = scene_with_flags(&original);
            let mut steps = 0usize;
            for_each_light::<(), _>(&mut scene, |light| {
                let scene = light.scene();
                let enabled: Vec<usize> = scene
                    .lights
                    .iter()
                    .enumerate()
                    .filter(|(_, l)| l.enabled)
                    .map(|(i, _)| i)
                    .collect();
                assert_eq!(enabled, vec![light.index()]);
                assert!(scene.lights[light.index()].object_active);
                steps += 1;
                Ok(())
            })
            .unwrap();
            prop_assert_eq!(steps, original.len());
            prop_assert_eq!(flags(&scene), original);
        }
    }
}
