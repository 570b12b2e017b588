//! Redirect system demonstration.
//!
//! This example shows how to:
//! - Declare native tags and renames with `native_tags!`
//! - Load them alongside config-style rows
//! - Upgrade persisted tag names through redirects

use gameplay_tags::*;

native_tags! {
    pub mod Tags {
        Equipment {
            Weapon {
                /// One-handed blades.
                Blade;
                Bow;
            }
        }

        Legacy {
            #[redirect = "Equipment.Weapon.Blade"]
            OldSword;

            #[redirect = "Equipment.Weapon.Bow"]
            OldBow;

            // Retired with no replacement
            #[redirect = ""]
            OldShield;
        }
    }
}

fn main() {
    println!("=== Redirect System Example ===\n");

    let mut registry = TagRegistry::new(TagSettings::default());
    registry.initialize(
        TagSources::new()
            .with_native_tags(Tags::ROWS)
            .with_native_redirects(Tags::REDIRECTS)
            .with_default_tags(["Equipment.Armor.Helmet"]),
    );
    registry.done_adding_native_tags();

    // -------------------------------------------------------------------------
    // 1. Single names
    // -------------------------------------------------------------------------
    println!("1. Resolving old names:");
    for old in [
        Tags::Legacy::OldSword::OLD_PATH,
        Tags::Legacy::OldBow::OLD_PATH,
        Tags::Legacy::OldShield::OLD_PATH,
    ] {
        match registry.import_tag(old) {
            Some(tag) => println!("   {old} -> {tag}"),
            None => println!("   {old} -> (retired)"),
        }
    }
    println!();

    // -------------------------------------------------------------------------
    // 2. A container loaded from a save file
    // -------------------------------------------------------------------------
    println!("2. Upgrading a saved container:");
    let mut saved: TagContainer = [
        "Legacy.OldSword",
        "Legacy.OldShield",
        "Equipment.Armor.Helmet",
    ]
    .into_iter()
    .map(Tag::unchecked)
    .collect();
    println!("   before: {:?}", saved.as_slice());
    registry.resolve_container(&mut saved);
    println!("   after:  {:?}", saved.as_slice());
    println!();

    // -------------------------------------------------------------------------
    // 3. Hierarchy checks on the upgraded tags
    // -------------------------------------------------------------------------
    let weapon = registry.request_tag(Tags::Equipment::Weapon::PATH, true);
    println!(
        "3. Has any {weapon}? {}",
        saved.has_tag(&weapon, &registry)
    );
}
