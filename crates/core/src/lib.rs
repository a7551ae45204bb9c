#![warn(missing_docs)]
//! Core primitives shared across the workspace: world and installation
//! coordinates, item stubs, and block snapshots.

pub mod block;
pub mod coords;
pub mod id;
pub mod item;

// Re-export commonly used types
pub use block::{
    block_ids, describe_attachment, describe_facing, BlockDescriptor, HopperFacing,
    InventorySlot, RecordItem, TileEntity, TorchAttachment,
};
pub use coords::{
    absolute_to_relative, base_coordinate, relative_to_absolute, CellOffset, LogicalPosition,
    WallSide, WorldPos,
};
pub use id::{NamespacedId, NamespacedIdError, DEFAULT_NAMESPACE};
pub use item::{follow_tag_path, ItemStub, ItemVariant, StubError, VariantKind};
