use crate::errors::{AppError, ResultExt};
use crate::models::{NewPlace, Place, Society};
use reqwest::{Client, Response, Url};
use std::time::Duration;

/// Client for the remote places store.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct PlacesClient {
    client: Client,
    base_url: Url,
}

impl PlacesClient {
    /// Creates a new `PlacesClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Origin of the places API, e.g. `https://api.example.com`.
    /// * `timeout` - Per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::InternalError(format!(
                "Places API URL cannot be used as a base: {}",
                base_url
            )));
        }

        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            AppError::InternalError(format!("Failed to create places client: {}", e))
        })?;

        Ok(Self { client, base_url })
    }

    /// Builds `{base}/api/places[/{segment}...]`, percent-encoding each segment.
    fn places_url(&self, segments: &[&str]) -> Result<Url, AppError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                AppError::InternalError("Places API URL cannot be used as a base".to_string())
            })?;
            path.pop_if_empty().extend(["api", "places"]).extend(segments);
        }
        Ok(url)
    }

    /// Fetches a place by name.
    ///
    /// # Arguments
    ///
    /// * `name` - Exact place name; sent as one encoded path segment.
    ///
    /// # Returns
    ///
    /// * `Result<Place, AppError>` - The place, `AppError::NotFound` on 404,
    ///   `AppError::Remote` on other statuses or an unreadable body,
    ///   `AppError::Network` (inside a context wrapper) when the request does
    ///   not complete.
    pub async fn get_place(&self, name: &str) -> Result<Place, AppError> {
        let url = self.places_url(&[name])?;
        tracing::info!("Fetching place '{}' from places API", name);
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .inspect_err(|e| tracing::error!("Place lookup for '{}' failed: {}", name, e))
            .with_context(|| format!("Place lookup for '{}'", name))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::info!("Place '{}' not found", name);
            return Err(AppError::NotFound(format!("Place '{}' not found", name)));
        }

        let response = ensure_success(response).await?;
        let place: Place = response.json().await.map_err(|e| {
            tracing::warn!("Unreadable place payload for '{}': {}", name, e);
            AppError::from(e)
        })?;

        tracing::info!(
            "✓ Place '{}' loaded with {} societies",
            place.name,
            place.societies.len()
        );
        Ok(place)
    }

    /// Checks whether the store already knows `name`.
    ///
    /// Any 2xx counts as existing and any other status as absent; only a
    /// transport failure is an error. The body is not read.
    pub async fn place_exists(&self, name: &str) -> Result<bool, AppError> {
        let url = self.places_url(&[name])?;
        tracing::debug!("Existence check GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .inspect_err(|e| tracing::error!("Existence check for '{}' failed: {}", name, e))
            .with_context(|| format!("Existence check for '{}'", name))?;

        let exists = response.status().is_success();
        tracing::info!(
            "Place '{}' {} (status {})",
            name,
            if exists { "exists" } else { "does not exist" },
            response.status()
        );
        Ok(exists)
    }

    /// Creates a place together with all of its societies in one request.
    pub async fn create_place(&self, place: &NewPlace) -> Result<(), AppError> {
        let url = self.places_url(&[])?;
        tracing::info!(
            "Creating place '{}' with {} societies",
            place.name,
            place.societies.len()
        );

        let response = self
            .client
            .post(url)
            .json(place)
            .send()
            .await
            .inspect_err(|e| tracing::error!("Create place '{}' failed: {}", place.name, e))
            .with_context(|| format!("Creating place '{}'", place.name))?;

        ensure_success(response).await?;
        tracing::info!("✓ Place '{}' created", place.name);
        Ok(())
    }

    /// Appends one society to an existing place.
    pub async fn append_society(&self, place_name: &str, society: &Society) -> Result<(), AppError> {
        let url = self.places_url(&[place_name, "societies"])?;
        tracing::info!("Adding society '{}' to '{}'", society.name, place_name);

        let response = self
            .client
            .post(url)
            .json(society)
            .send()
            .await
            .inspect_err(|e| {
                tracing::error!(
                    "Append society '{}' to '{}' failed: {}",
                    society.name,
                    place_name,
                    e
                )
            })
            .with_context(|| format!("Adding society '{}' to '{}'", society.name, place_name))?;

        ensure_success(response).await?;
        tracing::info!("✓ Society '{}' added to '{}'", society.name, place_name);
        Ok(())
    }
}

/// Turns a non-2xx response into `AppError::Remote`, keeping the body text.
async fn ensure_success(response: Response) -> Result<Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    tracing::warn!("Places API returned {}: {}", status, error_text);
    Err(AppError::Remote {
        status: status.as_u16(),
        body: error_text,
    })
}
