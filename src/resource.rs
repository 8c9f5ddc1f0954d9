use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use tracing::{debug, instrument, Span};

use crate::client::Client;
use crate::errors::{Result, WavefrontError};

/// A remote object managed through a Wavefront API collection
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    /// Name used in errors and logs
    const KIND: &'static str;

    /// Collection path below the API root
    const PATH: &'static str;

    /// Whether deletes move the entity to the trash unless forced
    const TRASHABLE: bool = false;

    /// Service-assigned identifier, unset until created
    fn id(&self) -> Option<&str>;

    /// Replace the identifier
    fn set_id(&mut self, id: Option<String>);

    /// Reject entities the service would refuse, before any request is sent
    fn validate(&self) -> Result<()>;
}

/// CRUD accessor for one collection
///
/// Every call is a single round trip; nothing is cached.
pub struct Resource<'a, T> {
    client: &'a Client,
    entity: PhantomData<fn() -> T>,
}

impl<'a, T: Entity> Resource<'a, T> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self {
            client,
            entity: PhantomData,
        }
    }

    /// Create the entity remotely
    ///
    /// On success `entity` is replaced with the stored version, so its
    /// identifier is set.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The entity fails local validation
    /// - The HTTP request fails
    /// - Wavefront rejects the entity
    #[instrument(
        name = "Resource::create",
        skip_all,
        fields(kind = T::KIND, id = tracing::field::Empty)
    )]
    pub async fn create(&self, entity: &mut T) -> Result<()> {
        entity.validate()?;

        let url = self.client.endpoint(&[T::PATH])?;

        debug!(url = %url, "Creating {}", T::KIND);

        let created: T = self
            .client
            .send(self.client.request(Method::POST, url).json(&*entity), T::KIND)
            .await?;

        let id = created
            .id()
            .filter(|id| !id.is_empty())
            .ok_or(WavefrontError::EmptyResponse { kind: T::KIND })?;
        Span::current().record("id", id);

        *entity = created;
        debug!("{} created", T::KIND);
        Ok(())
    }

    /// Refresh the entity from its remote state
    ///
    /// # Errors
    ///
    /// Returns [`WavefrontError::MissingId`] if the entity has no identifier,
    /// and an API error for which [`WavefrontError::is_not_found`] holds if it
    /// does not exist.
    #[instrument(name = "Resource::get", skip_all, fields(kind = T::KIND, id = entity.id()))]
    pub async fn get(&self, entity: &mut T) -> Result<()> {
        let id = require_id(entity)?;
        *entity = self.fetch(&id).await?;
        Ok(())
    }

    /// Fetch the entity with the given identifier
    #[instrument(name = "Resource::fetch", skip(self), fields(kind = T::KIND))]
    pub async fn fetch(&self, id: &str) -> Result<T> {
        if id.is_empty() {
            return Err(WavefrontError::MissingId { kind: T::KIND });
        }

        let url = self.client.endpoint(&[T::PATH, id])?;

        debug!(url = %url, "Fetching {}", T::KIND);

        self.client
            .send(self.client.request(Method::GET, url), T::KIND)
            .await
    }

    /// Replace the remote state of an existing entity
    ///
    /// On success `entity` is replaced with the stored version.
    ///
    /// Empty fields (`None`, empty strings, lists and maps) are not sent, so
    /// Wavefront keeps their stored values: an update cannot clear a field,
    /// and the old value comes back into `entity`. Delete and recreate the
    /// entity to drop a field.
    #[instrument(name = "Resource::update", skip_all, fields(kind = T::KIND, id = entity.id()))]
    pub async fn update(&self, entity: &mut T) -> Result<()> {
        let id = require_id(entity)?;
        entity.validate()?;

        let url = self.client.endpoint(&[T::PATH, &id])?;

        debug!(url = %url, "Updating {}", T::KIND);

        let updated: T = self
            .client
            .send(self.client.request(Method::PUT, url).json(&*entity), T::KIND)
            .await?;

        *entity = updated;
        debug!("{} updated", T::KIND);
        Ok(())
    }

    /// Delete the entity remotely and clear its identifier
    ///
    /// For trashable collections (alerts) `force` deletes permanently instead
    /// of moving the entity to the trash. Other collections ignore it: targets
    /// have no trash, and a target still referenced by an alert is rejected
    /// with a [`WavefrontError::Api`] error whatever `force` says. Delete
    /// the referencing alerts first.
    #[instrument(
        name = "Resource::delete",
        skip_all,
        fields(kind = T::KIND, id = entity.id(), force = force)
    )]
    pub async fn delete(&self, entity: &mut T, force: bool) -> Result<()> {
        let id = require_id(entity)?;

        let url = self.client.endpoint(&[T::PATH, &id])?;

        debug!(url = %url, "Deleting {}", T::KIND);

        let mut request = self.client.request(Method::DELETE, url);
        if T::TRASHABLE {
            request = request.query(&[("skipTrash", force)]);
        }

        self.client.execute(request).await?;

        entity.set_id(None);
        debug!("{} deleted", T::KIND);
        Ok(())
    }
}

fn require_id<T: Entity>(entity: &T) -> Result<String> {
    entity
        .id()
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
        .ok_or(WavefrontError::MissingId { kind: T::KIND })
}
