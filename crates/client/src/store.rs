//! The client state container.
//!
//! # Lifecycle
//!
//! `Store::new` → `hydrate` → any number of actions and `commit`s →
//! `teardown`. Every change goes through [`Store::commit`] with a
//! [`Mutation`]; mutations that touch persisted slices are written through to
//! the snapshot before `commit` returns.

use serde_json::Value;
use tracing::{debug, error, instrument};

use mindoro_core::{OrderId, ProductId, Role, UserId};

use crate::api::StartedSession;
use crate::auth::{AuthState, JwtPayloadCodec, SessionToken, TokenCodec};
use crate::cart::{Cart, CartDisplay, CartItems, CartPosition, ProductQuantity};
use crate::catalog::{Catalog, Product, ProductDraft, ProductEditor};
use crate::config::{ClientConfig, DEFAULT_STORAGE_KEY};
use crate::pos::{PosState, StartSessionField};
use crate::snapshot::{Snapshot, SnapshotStore};
use crate::storage::{DurableStorage, StorageError};

/// All client state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientState {
    pub auth: AuthState,
    pub cart: Cart,
    pub cart_display: CartDisplay,
    pub pos: PosState,
    pub catalog: Catalog,
    pub editor: ProductEditor,
}

/// A change to the client state.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    // Auth
    SetAuth {
        token: SessionToken,
        user_id: UserId,
        role: Role,
    },
    ResetAuth,
    SetFcmToken(Option<String>),

    // Cart
    UpdateCart(Vec<ProductQuantity>),
    UpdateCartItemQuantity {
        product_id: ProductId,
        quantity: u32,
    },
    RemoveFromCart(ProductId),
    ClearCart,
    SetCartVisible(bool),
    SetCartPosition(CartPosition),

    // POS
    SetStartSessionField {
        field: StartSessionField,
        value: String,
    },
    StartSessionRequested,
    SessionStarted {
        started: StartedSession,
        message: String,
    },
    SessionStartFailed {
        message: String,
    },
    SetCurrentOrder(OrderId),
    SetSessions(Vec<Value>),
    SetSessionDetails(Value),
    ResetPos,

    // Catalog
    SetProducts(Vec<Product>),
    SetLowStockProducts(Vec<Product>),
    SetStockWarning(String),

    // Product editor
    EditProduct(Value),
    SetProduct(ProductDraft),
    ClearProduct,
    SetProductPhoto(String),
    SetEditing {
        product_id: Option<ProductId>,
        editing: bool,
    },
}

impl Mutation {
    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SetAuth { .. } => "set_auth",
            Self::ResetAuth => "reset_auth",
            Self::SetFcmToken(_) => "set_fcm_token",
            Self::UpdateCart(_) => "update_cart",
            Self::UpdateCartItemQuantity { .. } => "update_cart_item_quantity",
            Self::RemoveFromCart(_) => "remove_from_cart",
            Self::ClearCart => "clear_cart",
            Self::SetCartVisible(_) => "set_cart_visible",
            Self::SetCartPosition(_) => "set_cart_position",
            Self::SetStartSessionField { .. } => "set_start_session_field",
            Self::StartSessionRequested => "start_session_requested",
            Self::SessionStarted { .. } => "session_started",
            Self::SessionStartFailed { .. } => "session_start_failed",
            Self::SetCurrentOrder(_) => "set_current_order",
            Self::SetSessions(_) => "set_sessions",
            Self::SetSessionDetails(_) => "set_session_details",
            Self::ResetPos => "reset_pos",
            Self::SetProducts(_) => "set_products",
            Self::SetLowStockProducts(_) => "set_low_stock_products",
            Self::SetStockWarning(_) => "set_stock_warning",
            Self::EditProduct(_) => "edit_product",
            Self::SetProduct(_) => "set_product",
            Self::ClearProduct => "clear_product",
            Self::SetProductPhoto(_) => "set_product_photo",
            Self::SetEditing { .. } => "set_editing",
        }
    }

    /// Whether the mutation touches a slice that is part of the snapshot.
    #[must_use]
    pub const fn is_persisted(&self) -> bool {
        !matches!(
            self,
            Self::SetCartVisible(_)
                | Self::SetCartPosition(_)
                | Self::EditProduct(_)
                | Self::SetProduct(_)
                | Self::ClearProduct
                | Self::SetProductPhoto(_)
                | Self::SetEditing { .. }
        )
    }
}

impl ClientState {
    /// Apply a mutation in memory.
    pub fn apply(&mut self, mutation: Mutation) {
        match mutation {
            Mutation::SetAuth {
                token,
                user_id,
                role,
            } => self.auth.establish(token, user_id, role),
            Mutation::ResetAuth => self.auth.reset(),
            Mutation::SetFcmToken(token) => self.auth.fcm_token = token,

            Mutation::UpdateCart(items) => self.cart.add_or_merge(items),
            Mutation::UpdateCartItemQuantity {
                product_id,
                quantity,
            } => {
                self.cart.set_quantity(product_id, quantity);
            }
            Mutation::RemoveFromCart(product_id) => {
                self.cart.remove(product_id);
            }
            Mutation::ClearCart => self.cart.clear(),
            Mutation::SetCartVisible(visible) => self.cart_display.visible = visible,
            Mutation::SetCartPosition(position) => self.cart_display.position = position,

            Mutation::SetStartSessionField { field, value } => self.pos.start_form.set(field, value),
            Mutation::StartSessionRequested => self.pos.begin_start(),
            Mutation::SessionStarted { started, message } => {
                self.pos.finish_started(started, message);
            }
            Mutation::SessionStartFailed { message } => self.pos.finish_failed(message),
            Mutation::SetCurrentOrder(order_id) => self.pos.current_order_id = Some(order_id),
            Mutation::SetSessions(sessions) => self.pos.sessions = sessions,
            Mutation::SetSessionDetails(details) => self.pos.session_details = Some(details),
            Mutation::ResetPos => self.pos = PosState::default(),

            Mutation::SetProducts(products) => self.catalog.products = products,
            Mutation::SetLowStockProducts(products) => self.catalog.low_stock_products = products,
            Mutation::SetStockWarning(warning) => self.catalog.stock_warning = warning,

            Mutation::EditProduct(edited) => self.editor.draft.apply_edit(&edited),
            Mutation::SetProduct(draft) => self.editor.draft = draft,
            Mutation::ClearProduct => self.editor.draft = ProductDraft::default(),
            Mutation::SetProductPhoto(photo) => self.editor.draft.photo = photo,
            Mutation::SetEditing {
                product_id,
                editing,
            } => {
                self.editor.editing_product_id = product_id;
                self.editor.is_editing = editing;
            }
        }
    }
}

/// How the store persists itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Storage key of the snapshot.
    pub storage_key: String,
    /// Persist across restarts (persistent scope) rather than for the
    /// session only.
    pub remember_me: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            remember_me: true,
        }
    }
}

impl From<&ClientConfig> for StoreOptions {
    fn from(config: &ClientConfig) -> Self {
        Self {
            storage_key: config.storage_key.clone(),
            remember_me: config.remember_me,
        }
    }
}

/// The client state container.
pub struct Store {
    state: ClientState,
    snapshots: SnapshotStore,
    codec: Box<dyn TokenCodec>,
}

impl Store {
    /// Create a store with empty state over `storage`.
    ///
    /// Nothing is read until [`Store::hydrate`].
    #[must_use]
    pub fn new(storage: DurableStorage, options: StoreOptions) -> Self {
        Self {
            state: ClientState::default(),
            snapshots: SnapshotStore::new(storage, options.storage_key, options.remember_me),
            codec: Box::new(JwtPayloadCodec),
        }
    }

    /// Replace the token codec.
    #[must_use]
    pub fn with_codec(mut self, codec: impl TokenCodec + 'static) -> Self {
        self.codec = Box::new(codec);
        self
    }

    /// Restore state from the stored snapshot, then initialize auth.
    #[instrument(skip_all)]
    pub fn hydrate(&mut self) {
        if let Some(snapshot) = self.snapshots.load() {
            snapshot.restore_into(&mut self.state);
        }
        self.initialize();
    }

    #[must_use]
    pub const fn state(&self) -> &ClientState {
        &self.state
    }

    /// Apply a mutation and write the snapshot through if it changed a
    /// persisted slice.
    ///
    /// A failed write is logged; the in-memory change stands.
    pub fn commit(&mut self, mutation: Mutation) {
        let name = mutation.name();
        let persisted = mutation.is_persisted();
        self.state.apply(mutation);
        debug!(mutation = name, "Committed");

        if persisted {
            self.persist();
        }
    }

    fn persist(&mut self) {
        let snapshot = Snapshot::capture(&self.state);
        if let Err(e) = self.snapshots.save(&snapshot) {
            error!(error = %e, key = self.snapshots.key(), "Failed to write snapshot");
        }
    }

    /// Switch between remembering the session across restarts and keeping
    /// it for this session only. The snapshot moves to the new scope.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the copy in the old scope cannot be removed.
    pub fn set_remember_me(&mut self, remember_me: bool) -> Result<(), StorageError> {
        self.snapshots.set_remember_me(remember_me)?;
        self.persist();
        Ok(())
    }

    pub(crate) fn snapshots_mut(&mut self) -> &mut SnapshotStore {
        &mut self.snapshots
    }

    pub(crate) fn codec(&self) -> &dyn TokenCodec {
        self.codec.as_ref()
    }

    /// The underlying storage.
    #[must_use]
    pub const fn storage(&self) -> &DurableStorage {
        self.snapshots.storage()
    }

    /// Write a final snapshot and hand back the storage.
    #[must_use]
    pub fn teardown(mut self) -> DurableStorage {
        self.persist();
        self.snapshots.into_storage()
    }

    // ===== Cart =====

    /// Add one item or a batch to the cart, merging by product id.
    pub fn add_to_cart(&mut self, items: impl Into<CartItems>) {
        self.commit(Mutation::UpdateCart(items.into().into_vec()));
    }

    pub fn set_cart_quantity(&mut self, product_id: ProductId, quantity: u32) {
        self.commit(Mutation::UpdateCartItemQuantity {
            product_id,
            quantity,
        });
    }

    pub fn remove_from_cart(&mut self, product_id: ProductId) {
        self.commit(Mutation::RemoveFromCart(product_id));
    }

    pub fn clear_cart(&mut self) {
        self.commit(Mutation::ClearCart);
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state)
            .field("snapshots", &self.snapshots)
            .finish_non_exhaustive()
    }
}
