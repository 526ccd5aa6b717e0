//! Model client trait
//!
//! A model client turns one prompt, a persona and optional attachments into
//! one reply. Calls are stateless: no earlier turns are sent.

use crate::attachments::FileAttachment;
use crate::error::ProviderError;
use crate::roles::Role;
use async_trait::async_trait;

/// A hosted generative model
///
/// Implementors must classify every failure into a [`ProviderError`] at the
/// point the response is inspected; callers never look at message text.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use cemtras::attachments::FileAttachment;
/// use cemtras::error::ProviderError;
/// use cemtras::providers::ModelClient;
/// use cemtras::roles::Role;
///
/// struct Echo;
///
/// #[async_trait]
/// impl ModelClient for Echo {
///     async fn generate(
///         &self,
///         prompt: &str,
///         _role: Role,
///         _attachments: &[FileAttachment],
///     ) -> Result<String, ProviderError> {
///         Ok(prompt.to_string())
///     }
///
///     fn model(&self) -> &str {
///         "echo"
///     }
/// }
/// ```
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Generate a reply to `prompt` in the voice of `role`
    ///
    /// Only image and PDF attachments are forwarded to the model; other
    /// attachment types stay in the transcript but are not sent.
    ///
    /// # Errors
    ///
    /// Returns a classified [`ProviderError`]; an empty reply is an error,
    /// never an empty `Ok`.
    async fn generate(
        &self,
        prompt: &str,
        role: Role,
        attachments: &[FileAttachment],
    ) -> Result<String, ProviderError>;

    /// Name of the model this client talks to
    fn model(&self) -> &str;
}
