//! Remote publication: the Load step.
//!
//! [`publish`] attaches `origin` to a staged repository and pushes every
//! local branch in a single attempt. The remote's advertised heads are read
//! first; when they already match, nothing is sent and the outcome is
//! [`PushOutcome::UpToDate`], which is a success.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;

use git2::{
    BranchType, CertificateCheckStatus, Cred, CredentialType, Direction, ErrorCode, Oid,
    PushOptions, Remote, RemoteCallbacks, Repository,
};
use serde::Serialize;

use crate::error::PublishError;
use crate::stage::StagedRepository;

/// Name under which the target remote is registered.
pub const REMOTE_NAME: &str = "origin";

// ---------------------------------------------------------------------------
// Target
// ---------------------------------------------------------------------------

/// Whether the server certificate is verified during the push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TlsVerification {
    #[default]
    Verify,
    /// Accept self-signed or otherwise unverifiable certificates.
    SkipVerify,
}

impl TlsVerification {
    /// Whether the push overrides libgit2's certificate verdict.
    pub fn accepts_any_certificate(self) -> bool {
        self == TlsVerification::SkipVerify
    }
}

/// Where and how to push. Never persisted.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RemoteTarget {
    pub url: String,
    pub username: String,
    /// Password or access token.
    pub password: String,
    pub tls: TlsVerification,
}

impl RemoteTarget {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    pub fn with_tls(mut self, tls: TlsVerification) -> Self {
        self.tls = tls;
        self
    }

    /// Basic auth is used when either half of the credentials is set.
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() || !self.password.is_empty()
    }
}

impl fmt::Debug for RemoteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let password = if self.password.is_empty() { "" } else { "<redacted>" };
        f.debug_struct("RemoteTarget")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &password)
            .field("tls", &self.tls)
            .finish()
    }
}

/// Result of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PushOutcome {
    /// These references were updated on the remote.
    Pushed { refs: Vec<String> },
    /// The remote already had every local branch at the same commit.
    UpToDate,
}

// ---------------------------------------------------------------------------
// publish
// ---------------------------------------------------------------------------

/// Push the staged repository to `target`.
///
/// Local history is never rewritten; only `origin` and its remote-tracking
/// refs are added. A failed publish can be retried against the same staged
/// repository.
pub fn publish(staged: &StagedRepository, target: &RemoteTarget) -> Result<PushOutcome, PublishError> {
    if target.url.trim().is_empty() {
        return Err(PublishError::EmptyUrl);
    }
    let repo = staged.repository();
    let mut remote = attach_remote(repo, &target.url)?;

    if target.tls.accepts_any_certificate() {
        tracing::warn!(
            "TLS certificate verification disabled for {}; server identity is not checked",
            target.url
        );
    }
    if !target.has_credentials() {
        tracing::debug!("no credentials supplied; pushing unauthenticated");
    }

    let local = local_branches(repo)?;
    let advertised = advertised_heads(&mut remote, target)?;
    let pending: Vec<String> = local
        .iter()
        .filter(|(name, oid)| advertised.get(name) != Some(oid))
        .map(|(name, _)| name.clone())
        .collect();

    if pending.is_empty() {
        tracing::info!("remote already up-to-date");
        return Ok(PushOutcome::UpToDate);
    }

    push_refs(&mut remote, &pending, target)?;
    tracing::info!("pushed {} to {}", pending.join(", "), target.url);
    Ok(PushOutcome::Pushed { refs: pending })
}

// ---------------------------------------------------------------------------
// Remote registration
// ---------------------------------------------------------------------------

/// Register `origin` → `url`, or reuse it if it already points at `url`.
fn attach_remote<'r>(repo: &'r Repository, url: &str) -> Result<Remote<'r>, PublishError> {
    match repo.find_remote(REMOTE_NAME) {
        Ok(existing) => {
            if existing.url() == Some(url) {
                tracing::debug!("remote '{REMOTE_NAME}' already attached to {url}");
                return Ok(existing);
            }
            Err(PublishError::RemoteConflict {
                name: REMOTE_NAME.to_string(),
                existing: existing.url().unwrap_or_default().to_string(),
                requested: url.to_string(),
            })
        }
        Err(err) if err.code() == ErrorCode::NotFound => {
            tracing::debug!("attaching remote '{REMOTE_NAME}' -> {url}");
            repo.remote(REMOTE_NAME, url).map_err(git_err("create remote"))
        }
        Err(err) => Err(git_err("find remote")(err)),
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Per-connection callback state.
#[derive(Default)]
struct Session {
    credential_requests: Cell<u32>,
    rejections: RefCell<Vec<(String, String)>>,
}

impl Session {
    fn auth_rejected(&self) -> bool {
        self.credential_requests.get() > 1
    }

    fn classify(&self, op: &'static str, target: &RemoteTarget, source: git2::Error) -> PublishError {
        if self.auth_rejected() {
            PublishError::AuthRejected {
                url: target.url.clone(),
                source,
            }
        } else {
            PublishError::Git { op, source }
        }
    }
}

fn callbacks<'a>(target: &'a RemoteTarget, session: &'a Session) -> RemoteCallbacks<'a> {
    let mut callbacks = RemoteCallbacks::new();

    if target.has_credentials() {
        callbacks.credentials(move |_url, _username_from_url, allowed| {
            let attempt = session.credential_requests.get() + 1;
            session.credential_requests.set(attempt);
            // libgit2 asks again after a 401; offering the same pair would loop.
            if attempt > 1 {
                return Err(git2::Error::from_str("credentials rejected by remote"));
            }
            if !allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
                return Err(git2::Error::from_str(
                    "remote does not accept username/password authentication",
                ));
            }
            Cred::userpass_plaintext(&target.username, &target.password)
        });
    }

    if target.tls.accepts_any_certificate() {
        callbacks.certificate_check(|_cert, host| Ok(accept_certificate(host)));
    }

    callbacks.push_update_reference(move |refname, status| {
        if let Some(message) = status {
            session
                .rejections
                .borrow_mut()
                .push((refname.to_string(), message.to_string()));
        }
        Ok(())
    });

    callbacks
}

fn accept_certificate(host: &str) -> CertificateCheckStatus {
    tracing::debug!("accepting unverified certificate for {host}");
    CertificateCheckStatus::CertificateOk
}

/// Heads the remote currently advertises for push, keyed by ref name.
fn advertised_heads(
    remote: &mut Remote<'_>,
    target: &RemoteTarget,
) -> Result<HashMap<String, Oid>, PublishError> {
    let session = Session::default();
    let connection = remote
        .connect_auth(Direction::Push, Some(callbacks(target, &session)), None)
        .map_err(|e| session.classify("connect", target, e))?;
    let heads = connection
        .list()
        .map_err(git_err("list remote refs"))?
        .iter()
        .map(|head| (head.name().to_string(), head.oid()))
        .collect();
    Ok(heads)
}

fn push_refs(remote: &mut Remote<'_>, refs: &[String], target: &RemoteTarget) -> Result<(), PublishError> {
    let session = Session::default();
    let mut options = PushOptions::new();
    options.remote_callbacks(callbacks(target, &session));

    let refspecs: Vec<String> = refs.iter().map(|r| format!("{r}:{r}")).collect();
    remote
        .push(&refspecs[..], Some(&mut options))
        .map_err(|e| session.classify("push", target, e))?;

    let rejected = session.rejections.borrow_mut().drain(..).next();
    if let Some((refname, message)) = rejected {
        return Err(PublishError::Rejected { refname, message });
    }
    Ok(())
}

fn local_branches(repo: &Repository) -> Result<Vec<(String, Oid)>, PublishError> {
    let mut out = Vec::new();
    for entry in repo
        .branches(Some(BranchType::Local))
        .map_err(git_err("list branches"))?
    {
        let (branch, _) = entry.map_err(git_err("list branches"))?;
        let reference = branch.get();
        if let (Some(name), Some(oid)) = (reference.name(), reference.target()) {
            out.push((name.to_string(), oid));
        }
    }
    out.sort();
    Ok(out)
}

fn git_err(op: &'static str) -> impl FnOnce(git2::Error) -> PublishError {
    move |source| PublishError::Git { op, source }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_present_when_either_half_set() {
        assert!(!RemoteTarget::new("https://git.example.com/r.git").has_credentials());
        assert!(RemoteTarget::new("u").with_credentials("alice", "").has_credentials());
        assert!(RemoteTarget::new("u").with_credentials("", "token").has_credentials());
    }

    #[test]
    fn debug_output_redacts_password() {
        let target = RemoteTarget::new("https://git.example.com/r.git")
            .with_credentials("alice", "hunter2");
        let debug = format!("{target:?}");
        assert!(!debug.contains("hunter2"), "{debug}");
        assert!(debug.contains("<redacted>"));
        assert!(debug.contains("alice"));
    }

    #[test]
    fn tls_verification_is_on_by_default() {
        assert_eq!(RemoteTarget::default().tls, TlsVerification::Verify);
        assert!(!RemoteTarget::default().tls.accepts_any_certificate());
    }

    #[test]
    fn only_skip_verify_overrides_certificate_check() {
        assert!(TlsVerification::SkipVerify.accepts_any_certificate());
        assert!(!TlsVerification::Verify.accepts_any_certificate());
        assert!(matches!(
            accept_certificate("git.internal"),
            CertificateCheckStatus::CertificateOk
        ));
    }

    #[test]
    fn session_flags_repeated_credential_requests() {
        let session = Session::default();
        assert!(!session.auth_rejected());
        session.credential_requests.set(2);
        let err = session.classify(
            "push",
            &RemoteTarget::new("https://x"),
            git2::Error::from_str("401"),
        );
        assert!(matches!(err, PublishError::AuthRejected { .. }));
    }
}
