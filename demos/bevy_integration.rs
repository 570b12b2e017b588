//! Bevy integration example.
//!
//! This example shows how to:
//! - Set up `GameplayTagsPlugin` with native tags
//! - Use the `OwnedTags` component for entity tags
//! - Query entities by tag hierarchy in systems

use bevy::prelude::*;
use gameplay_tags::bevy::{GameplayTagsPlugin, OwnedTags};
use gameplay_tags::{TagRegistry, TagSettings, TagSources, native_tags};

native_tags! {
    pub mod Tags {
        Movement {
            Idle;
            Running;
        }
        Status {
            Poisoned;
            Burning;
            #[redirect = "Status.Burning"]
            OnFire;
        }
    }
}

#[derive(Component)]
struct Callsign(&'static str);

fn main() {
    let mut app = App::new();
    app.add_plugins(
        GameplayTagsPlugin::new(TagSettings::default()).with_sources(
            TagSources::new()
                .with_native_tags(Tags::ROWS)
                .with_native_redirects(Tags::REDIRECTS),
        ),
    )
    .add_systems(Startup, spawn_entities)
    .add_systems(Update, check_status_effects);

    // Startup, then one frame: redirects on new OwnedTags run in PreUpdate.
    app.update();
}

fn spawn_entities(mut commands: Commands, registry: Res<TagRegistry>) {
    let tag = |path: &str| registry.request_tag(path, true);

    commands.spawn((
        Callsign("Player"),
        OwnedTags::new().with(tag(Tags::Movement::Running::PATH)),
    ));
    commands.spawn((
        Callsign("Goblin"),
        OwnedTags::new()
            .with(tag(Tags::Movement::Idle::PATH))
            .with(tag(Tags::Status::Poisoned::PATH)),
    ));
    // Written under an old name; upgraded to Status.Burning on spawn.
    commands.spawn((
        Callsign("Torch"),
        OwnedTags::new().with(gameplay_tags::Tag::unchecked(Tags::Status::OnFire::OLD_PATH)),
    ));
}

fn check_status_effects(registry: Res<TagRegistry>, query: Query<(&Callsign, &OwnedTags)>) {
    let status = registry.request_tag(Tags::Status::PATH, true);
    for (name, tags) in &query {
        if tags.has_tag(&status, &registry) {
            println!("{} has a status effect: {:?}", name.0, tags.as_slice());
        } else {
            println!("{} is unaffected", name.0);
        }
    }
}
