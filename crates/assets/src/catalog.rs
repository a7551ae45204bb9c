//! Item metadata lookup.
//!
//! The catalog file (`items.json`) maps `namespace -> path -> record`. A
//! record may declare variants by damage value (`damageValues`), by status
//! effect (`effects`, keyed by effect namespace then path) or by a tag value
//! found at `tagPath` (`tagVariants`, keyed by the value's string form, `""`
//! for "no tag"). Variant entries override the base record's fields.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use cloudaudit_core::{InventorySlot, ItemStub, ItemVariant, NamespacedId, StubError, VariantKind};

/// Default maximum stack size of a stackable item.
pub const DEFAULT_STACK_SIZE: u32 = 64;

/// Errors raised while resolving item metadata.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No record for the id.
    #[error("unknown item {0}")]
    UnknownItem(String),
    /// The id exists but not with the requested variant.
    #[error("the item {id} does not occur with {variant}")]
    UnknownVariant {
        /// Item id.
        id: String,
        /// Requested variant, described.
        variant: String,
    },
    /// The stub carries a discriminator the item does not use.
    #[error("the item {id} has no {kind} variants")]
    NoVariants {
        /// Item id.
        id: String,
        /// Kind of discriminator given.
        kind: &'static str,
    },
    /// The item requires a discriminator the stub does not carry.
    #[error("must specify {kind} for {id}")]
    MissingVariant {
        /// Item id.
        id: String,
        /// Kind of discriminator required.
        kind: &'static str,
    },
    /// An inventory slot could not be turned into an item stub.
    #[error(transparent)]
    Stub(#[from] StubError),
}

/// Resolved metadata for one item stub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemInfo {
    /// Display name.
    pub name: String,
    /// Maximum stack size (1 for unstackable items).
    pub stack_size: u32,
    /// Durability, for items with a durability bar.
    pub durability: Option<u32>,
    /// Grid image file name.
    pub image: Option<String>,
}

impl ItemInfo {
    /// Whether more than one item fits in a slot.
    pub fn is_stackable(&self) -> bool {
        self.stack_size > 1
    }

    /// Whether the item has a durability bar.
    pub fn has_durability(&self) -> bool {
        self.durability.is_some()
    }
}

/// Item metadata capability.
pub trait ItemCatalog {
    /// Metadata of a stub. Fails for unknown ids and variants.
    fn item(&self, stub: &ItemStub) -> Result<ItemInfo, CatalogError>;

    /// Which discriminator distinguishes the item's variants, if any.
    fn variant_kind(&self, id: &NamespacedId) -> Result<Option<VariantKind>, CatalogError>;

    /// Path to the discriminating value inside the item's tag.
    fn tag_path(&self, id: &NamespacedId) -> Result<Option<&[Value]>, CatalogError>;

    /// Stub describing the contents of an inventory slot.
    fn slot_stub(&self, slot: &InventorySlot) -> Result<ItemStub, CatalogError> {
        let id = NamespacedId::parse(&slot.id).map_err(StubError::from)?;
        let kind = self.variant_kind(&id)?;
        let path = match kind {
            Some(VariantKind::Tag) => self.tag_path(&id)?,
            _ => None,
        };
        Ok(ItemStub::from_slot(slot, kind, path)?)
    }

    /// Whether a slot holds the item named by `stub`.
    fn slot_matches(&self, stub: &ItemStub, slot: &InventorySlot) -> Result<bool, CatalogError> {
        let path = match stub.variant() {
            ItemVariant::Tag(_) => self.tag_path(stub.id())?,
            _ => None,
        };
        Ok(stub.matches_slot(slot, path))
    }

    /// Maximum stack size of the item in a slot.
    fn slot_stack_size(&self, slot: &InventorySlot) -> Result<u32, CatalogError> {
        let stub = self.slot_stub(slot)?;
        Ok(self.item(&stub)?.stack_size)
    }

    /// Name for messages: the catalog name, else the stub's own text.
    fn display_name(&self, stub: &ItemStub) -> String {
        self.item(stub)
            .map(|info| info.name)
            .unwrap_or_else(|_| stub.to_string())
    }

    /// Name for messages describing the contents of a slot, falling back to
    /// the raw id.
    fn slot_display_name(&self, slot: &InventorySlot) -> String {
        match self.slot_stub(slot) {
            Ok(stub) => self.display_name(&stub),
            Err(_) => slot.id.clone(),
        }
    }
}

impl<T: ItemCatalog + ?Sized> ItemCatalog for &T {
    fn item(&self, stub: &ItemStub) -> Result<ItemInfo, CatalogError> {
        (**self).item(stub)
    }

    fn variant_kind(&self, id: &NamespacedId) -> Result<Option<VariantKind>, CatalogError> {
        (**self).variant_kind(id)
    }

    fn tag_path(&self, id: &NamespacedId) -> Result<Option<&[Value]>, CatalogError> {
        (**self).tag_path(id)
    }
}

/// Either a yes/no flag or an explicit maximum stack size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
enum Stackable {
    Flag(bool),
    Size(u32),
}

impl Stackable {
    fn stack_size(self) -> u32 {
        match self {
            Stackable::Flag(true) => DEFAULT_STACK_SIZE,
            Stackable::Flag(false) => 1,
            Stackable::Size(size) => size,
        }
    }
}

/// Fields a variant entry may override.
#[derive(Debug, Clone, Default, Deserialize)]
struct VariantRecord {
    name: Option<String>,
    stackable: Option<Stackable>,
    durability: Option<u32>,
    image: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemRecord {
    #[serde(flatten)]
    base: VariantRecord,
    damage_values: Option<BTreeMap<String, VariantRecord>>,
    effects: Option<BTreeMap<String, BTreeMap<String, VariantRecord>>>,
    tag_path: Option<Vec<Value>>,
    tag_variants: Option<BTreeMap<String, VariantRecord>>,
}

impl ItemRecord {
    fn kind(&self) -> Option<VariantKind> {
        if self.damage_values.is_some() {
            Some(VariantKind::Damage)
        } else if self.effects.is_some() {
            Some(VariantKind::Effect)
        } else if self.tag_path.is_some() {
            Some(VariantKind::Tag)
        } else {
            None
        }
    }

    fn resolve(&self, stub: &ItemStub) -> Result<ItemInfo, CatalogError> {
        let id = stub.id().to_string();
        let kind = self.kind();
        let variant = match (stub.variant(), kind) {
            (ItemVariant::Base, None) => None,
            (ItemVariant::Base, Some(kind)) => {
                return Err(CatalogError::MissingVariant {
                    id,
                    kind: kind_name(kind),
                })
            }
            (ItemVariant::Damage(damage), Some(VariantKind::Damage)) => Some(
                self.damage_values
                    .as_ref()
                    .and_then(|values| values.get(&damage.to_string()))
                    .ok_or_else(|| CatalogError::UnknownVariant {
                        id: id.clone(),
                        variant: format!("the damage value {damage}"),
                    })?,
            ),
            (ItemVariant::Effect(effect), Some(VariantKind::Effect)) => {
                let (namespace, path) = effect
                    .split_once(':')
                    .unwrap_or(("minecraft", effect.as_str()));
                Some(
                    self.effects
                        .as_ref()
                        .and_then(|effects| effects.get(namespace))
                        .and_then(|effects| effects.get(path))
                        .ok_or_else(|| CatalogError::UnknownVariant {
                            id: id.clone(),
                            variant: format!("the effect {effect}"),
                        })?,
                )
            }
            (ItemVariant::Tag(value), Some(VariantKind::Tag)) => {
                let key = tag_variant_key(value.as_ref());
                Some(
                    self.tag_variants
                        .as_ref()
                        .and_then(|variants| variants.get(&key))
                        .ok_or_else(|| CatalogError::UnknownVariant {
                            id: id.clone(),
                            variant: if key.is_empty() {
                                "the empty tag variant".to_string()
                            } else {
                                format!("the tag variant {key}")
                            },
                        })?,
                )
            }
            (given, _) => {
                return Err(CatalogError::NoVariants {
                    id,
                    kind: match given {
                        ItemVariant::Damage(_) => "damage",
                        ItemVariant::Effect(_) => "effect",
                        _ => "tag",
                    },
                })
            }
        };

        let name = variant
            .and_then(|record| record.name.clone())
            .or_else(|| self.base.name.clone())
            .unwrap_or_else(|| stub.to_string());
        let image = variant
            .and_then(|record| record.image.clone())
            .or_else(|| self.base.image.clone());
        let stackable = variant
            .and_then(|record| record.stackable)
            .or(self.base.stackable)
            .unwrap_or(Stackable::Flag(true));
        let durability = variant
            .and_then(|record| record.durability)
            .or(self.base.durability);
        Ok(ItemInfo {
            name,
            stack_size: stackable.stack_size(),
            durability,
            image,
        })
    }
}

fn kind_name(kind: VariantKind) -> &'static str {
    match kind {
        VariantKind::Damage => "damage",
        VariantKind::Effect => "effect",
        VariantKind::Tag => "tag value",
    }
}

fn tag_variant_key(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Catalog backed by an `items.json` document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct JsonItemCatalog {
    plugins: BTreeMap<String, BTreeMap<String, ItemRecord>>,
}

impl JsonItemCatalog {
    /// Parse a catalog document.
    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    /// Number of items across all namespaces.
    pub fn len(&self) -> usize {
        self.plugins.values().map(BTreeMap::len).sum()
    }

    /// Returns true when the catalog has no items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn record(&self, id: &NamespacedId) -> Result<&ItemRecord, CatalogError> {
        self.plugins
            .get(id.namespace())
            .and_then(|items| items.get(id.path()))
            .ok_or_else(|| CatalogError::UnknownItem(id.to_string()))
    }
}

impl ItemCatalog for JsonItemCatalog {
    fn item(&self, stub: &ItemStub) -> Result<ItemInfo, CatalogError> {
        self.record(stub.id())?.resolve(stub)
    }

    fn variant_kind(&self, id: &NamespacedId) -> Result<Option<VariantKind>, CatalogError> {
        Ok(self.record(id)?.kind())
    }

    fn tag_path(&self, id: &NamespacedId) -> Result<Option<&[Value]>, CatalogError> {
        Ok(self.record(id)?.tag_path.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> JsonItemCatalog {
        serde_json::from_value(json!({
            "minecraft": {
                "stone": {
                    "name": "Stone",
                    "damageValues": {
                        "0": {"name": "Stone"},
                        "3": {"name": "Diorite", "image": "diorite.png"}
                    }
                },
                "ender_pearl": {"name": "Ender Pearl", "stackable": 16},
                "diamond_sword": {"name": "Diamond Sword", "stackable": false, "durability": 1561},
                "potion": {
                    "name": "Potion",
                    "stackable": false,
                    "effects": {"minecraft": {"swiftness": {"name": "Potion of Swiftness"}}}
                },
                "written_book": {
                    "name": "Written Book",
                    "stackable": 16,
                    "tagPath": ["title"],
                    "tagVariants": {"": {"name": "Blank Book"}, "Rules": {"name": "Rulebook"}}
                }
            }
        }))
        .unwrap()
    }

    fn stub(value: Value) -> ItemStub {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn resolves_base_items() {
        let cat = catalog();
        let info = cat.item(&ItemStub::parse("minecraft:ender_pearl").unwrap()).unwrap();
        assert_eq!(info.name, "Ender Pearl");
        assert_eq!(info.stack_size, 16);
        assert!(info.is_stackable());

        let sword = cat.item(&ItemStub::parse("diamond_sword").unwrap()).unwrap();
        assert_eq!(sword.stack_size, 1);
        assert!(!sword.is_stackable());
        assert!(sword.has_durability());
    }

    #[test]
    fn variants_override_base_fields() {
        let cat = catalog();
        let diorite = cat.item(&stub(json!({"id": "minecraft:stone", "damage": 3}))).unwrap();
        assert_eq!(diorite.name, "Diorite");
        assert_eq!(diorite.image.as_deref(), Some("diorite.png"));
        assert_eq!(diorite.stack_size, 64);

        let potion = cat
            .item(&stub(json!({"id": "minecraft:potion", "effect": "minecraft:swiftness"})))
            .unwrap();
        assert_eq!(potion.name, "Potion of Swiftness");
        assert_eq!(potion.stack_size, 1);

        let blank = cat
            .item(&stub(json!({"id": "minecraft:written_book", "tagValue": null})))
            .unwrap();
        assert_eq!(blank.name, "Blank Book");
        assert_eq!(blank.stack_size, 16);
    }

    #[test]
    fn variant_errors() {
        let cat = catalog();
        assert!(matches!(
            cat.item(&ItemStub::parse("minecraft:stone").unwrap()),
            Err(CatalogError::MissingVariant { .. })
        ));
        assert!(matches!(
            cat.item(&stub(json!({"id": "minecraft:stone", "damage": 9}))),
            Err(CatalogError::UnknownVariant { .. })
        ));
        assert!(matches!(
            cat.item(&stub(json!({"id": "minecraft:ender_pearl", "damage": 1}))),
            Err(CatalogError::NoVariants { .. })
        ));
        assert!(matches!(
            cat.item(&ItemStub::parse("minecraft:bedrock").unwrap()),
            Err(CatalogError::UnknownItem(_))
        ));
    }

    #[test]
    fn slot_helpers_use_variant_kind() {
        let cat = catalog();
        let slot = InventorySlot {
            slot: 0,
            id: "minecraft:written_book".into(),
            count: 1,
            damage: 0,
            tag: Some(json!({"title": "Rules"})),
        };
        assert_eq!(cat.slot_display_name(&slot), "Rulebook");
        assert_eq!(cat.slot_stack_size(&slot).unwrap(), 16);

        let rules = stub(json!({"id": "minecraft:written_book", "tagValue": "Rules"}));
        assert!(cat.slot_matches(&rules, &slot).unwrap());

        let unknown = InventorySlot {
            id: "minecraft:mystery".into(),
            ..slot
        };
        assert_eq!(cat.slot_display_name(&unknown), "minecraft:mystery");
    }
}
