//! Item stubs: a base id plus at most one variant discriminator.

use crate::block::InventorySlot;
use crate::id::{NamespacedId, NamespacedIdError, DEFAULT_NAMESPACE};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Errors raised while building an [`ItemStub`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StubError {
    /// The id failed to parse.
    #[error("invalid item id: {0}")]
    InvalidId(#[from] NamespacedIdError),
    /// More than one of damage, effect and tag value was given.
    #[error("item stub for {id} has more than one of damage, effect and tagValue")]
    ConflictingVariants {
        /// Offending item id.
        id: String,
    },
    /// A slot of an effect-variant item carries no `Potion` tag.
    #[error("slot holding {id} has no potion effect tag")]
    MissingEffect {
        /// Item id of the slot.
        id: String,
    },
}

/// Which discriminator distinguishes the variants of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantKind {
    /// Variants differ by damage value.
    Damage,
    /// Variants differ by status effect (potions, tipped arrows).
    Effect,
    /// Variants differ by a value found at a fixed path inside the NBT tag.
    Tag,
}

/// The variant half of an [`ItemStub`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemVariant {
    /// No discriminator.
    Base,
    /// A damage value.
    Damage(i16),
    /// A namespaced status-effect id.
    Effect(String),
    /// A tag value; `None` means "no tag at all".
    Tag(Option<Value>),
}

/// Identifies one storable kind of item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawStub", into = "RawStub")]
pub struct ItemStub {
    id: NamespacedId,
    variant: ItemVariant,
}

impl ItemStub {
    /// A stub without a variant discriminator.
    pub fn base(id: NamespacedId) -> Self {
        Self {
            id,
            variant: ItemVariant::Base,
        }
    }

    /// A stub with the given variant.
    pub fn with_variant(id: NamespacedId, variant: ItemVariant) -> Self {
        Self { id, variant }
    }

    /// Parse a bare id into a base stub.
    pub fn parse(raw: &str) -> Result<Self, StubError> {
        Ok(Self::base(NamespacedId::parse(raw)?))
    }

    /// Build a stub from optional discriminators, failing when more than one
    /// is present.
    pub fn from_parts(
        id: &str,
        damage: Option<i16>,
        effect: Option<String>,
        tag_value: Option<Option<Value>>,
    ) -> Result<Self, StubError> {
        let id = NamespacedId::parse(id)?;
        let variant = match (damage, effect, tag_value) {
            (None, None, None) => ItemVariant::Base,
            (Some(damage), None, None) => ItemVariant::Damage(damage),
            (None, Some(effect), None) => ItemVariant::Effect(effect),
            (None, None, Some(tag)) => ItemVariant::Tag(tag),
            _ => {
                return Err(StubError::ConflictingVariants { id: id.to_string() });
            }
        };
        Ok(Self { id, variant })
    }

    /// Reconstruct the stub describing the contents of an inventory slot.
    ///
    /// `kind` is the catalog's variant kind for the slot's item and
    /// `tag_path` its tag path when `kind` is [`VariantKind::Tag`].
    pub fn from_slot(
        slot: &InventorySlot,
        kind: Option<VariantKind>,
        tag_path: Option<&[Value]>,
    ) -> Result<Self, StubError> {
        let id = NamespacedId::parse(&slot.id)?;
        let variant = match kind {
            None => ItemVariant::Base,
            Some(VariantKind::Damage) => ItemVariant::Damage(slot.damage),
            Some(VariantKind::Effect) => {
                let effect = slot
                    .tag
                    .as_ref()
                    .and_then(|tag| tag.get("Potion"))
                    .and_then(Value::as_str)
                    .ok_or_else(|| StubError::MissingEffect {
                        id: slot.id.clone(),
                    })?;
                ItemVariant::Effect(effect.to_string())
            }
            Some(VariantKind::Tag) => ItemVariant::Tag(
                slot.tag
                    .as_ref()
                    .and_then(|tag| follow_tag_path(tag, tag_path.unwrap_or(&[])))
                    .cloned(),
            ),
        };
        Ok(Self { id, variant })
    }

    /// Item id.
    pub fn id(&self) -> &NamespacedId {
        &self.id
    }

    /// Variant discriminator.
    pub fn variant(&self) -> &ItemVariant {
        &self.variant
    }

    /// Whether this stub names exactly the given id with no variant.
    pub fn is(&self, raw_id: &str) -> bool {
        self.variant == ItemVariant::Base && self.id.matches(raw_id)
    }

    /// Whether the contents of `slot` are this item.
    ///
    /// `tag_path` is only consulted for tag variants; it is the catalog's
    /// path to the discriminating value inside the slot's tag.
    pub fn matches_slot(&self, slot: &InventorySlot, tag_path: Option<&[Value]>) -> bool {
        if !self.id.matches(&slot.id) {
            return false;
        }
        match &self.variant {
            ItemVariant::Base => true,
            ItemVariant::Damage(damage) => slot.damage == *damage,
            ItemVariant::Effect(effect) => slot
                .tag
                .as_ref()
                .and_then(|tag| tag.get("Potion"))
                .and_then(Value::as_str)
                .is_some_and(|potion| potion == effect),
            ItemVariant::Tag(expected) => match &slot.tag {
                Some(tag) => match follow_tag_path(tag, tag_path.unwrap_or(&[])) {
                    Some(found) => expected.as_ref() == Some(found),
                    None => false,
                },
                None => expected.is_none(),
            },
        }
    }
}

impl fmt::Display for ItemStub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = if self.id.namespace() == DEFAULT_NAMESPACE {
            self.id.path().to_string()
        } else {
            self.id.to_string()
        };
        match &self.variant {
            ItemVariant::Base => write!(f, "{name}"),
            ItemVariant::Damage(damage) => write!(f, "{name}/{damage}"),
            ItemVariant::Effect(effect) => match effect.strip_prefix("minecraft:") {
                Some(effect) => write!(f, "{name} of {effect}"),
                None => write!(f, "{name} with effect {effect}"),
            },
            ItemVariant::Tag(None) => write!(f, "{name} without tag"),
            ItemVariant::Tag(Some(Value::String(value))) => write!(f, "{name} with tag {value}"),
            ItemVariant::Tag(Some(value)) => write!(f, "{name} with tag {value}"),
        }
    }
}

/// Walk `path` through an NBT-like JSON tag: strings index objects and
/// integers index arrays.
pub fn follow_tag_path<'a>(tag: &'a Value, path: &[Value]) -> Option<&'a Value> {
    path.iter().try_fold(tag, |current, element| match element {
        Value::String(key) => current.get(key.as_str()),
        Value::Number(index) => index
            .as_u64()
            .and_then(|i| current.get(usize::try_from(i).ok()?)),
        _ => None,
    })
}

#[derive(Serialize, Deserialize)]
struct RawStub {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    damage: Option<i16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    effect: Option<String>,
    #[serde(
        rename = "tagValue",
        default,
        deserialize_with = "present_nullable",
        skip_serializing_if = "Option::is_none"
    )]
    tag_value: Option<Option<Value>>,
}

/// Distinguishes a present `null` from an absent field.
fn present_nullable<'de, D>(deserializer: D) -> Result<Option<Option<Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Value>::deserialize(deserializer).map(Some)
}

impl TryFrom<RawStub> for ItemStub {
    type Error = StubError;

    fn try_from(raw: RawStub) -> Result<Self, Self::Error> {
        ItemStub::from_parts(&raw.id, raw.damage, raw.effect, raw.tag_value)
    }
}

impl From<ItemStub> for RawStub {
    fn from(stub: ItemStub) -> Self {
        let id = stub.id.to_string();
        let (damage, effect, tag_value) = match stub.variant {
            ItemVariant::Base => (None, None, None),
            ItemVariant::Damage(damage) => (Some(damage), None, None),
            ItemVariant::Effect(effect) => (None, Some(effect), None),
            ItemVariant::Tag(tag) => (None, None, Some(tag)),
        };
        RawStub {
            id,
            damage,
            effect,
            tag_value,
        }
    }
}
