//! Git operations for acquiring upstream repositories
//!
//! Authentication is delegated entirely to git's native system:
//! - SSH keys from ~/.ssh/
//! - Git credential helpers
//! - Environment variables (GIT_SSH_COMMAND, etc.)

use std::borrow::Cow;
use std::path::Path;

use git2::{
    Cred, CredentialType, ErrorClass, FetchOptions, RemoteCallbacks, Repository, build::RepoBuilder,
};

use crate::error::{BootstrapError, Result};

/// Convert SCP-style SSH URLs (git@host:path) to ssh:// form, which libgit2
/// handles more reliably.
fn normalize_ssh_url(url: &str) -> Cow<'_, str> {
    if !url.starts_with("git@") {
        return Cow::Borrowed(url);
    }

    match url.split_once(':') {
        Some((host, path)) => {
            let path = path.trim_start_matches('/');
            Cow::Owned(format!("ssh://{host}/{path}"))
        }
        None => Cow::Borrowed(url),
    }
}

fn is_local(url: &str) -> bool {
    url.starts_with("file://") || Path::new(url).is_absolute()
}

/// Interpret a git2 error and provide a more user-friendly message
fn interpret_git_error(err: &git2::Error) -> String {
    let message = err.message().to_lowercase();

    if message.contains("not found") || message.contains("404") {
        "Repository not found".to_string()
    } else if message.contains("authentication") || message.contains("credentials") {
        "Authentication failed".to_string()
    } else if message.contains("permission denied") || message.contains("access denied") {
        "Permission denied".to_string()
    } else if message.contains("connection")
        || message.contains("network")
        || message.contains("timed out")
    {
        "Network error".to_string()
    } else if message.contains("exists and is not an empty directory") {
        "Target directory already exists and is not empty".to_string()
    } else if err.class() == ErrorClass::Http {
        format!("HTTP error: {}", err.message())
    } else if err.class() == ErrorClass::Ssh {
        format!("SSH error: {}", err.message())
    } else {
        err.message().to_string()
    }
}

/// Clone `url` into `target`.
///
/// Remote clones are shallow (depth 1); the bootstrapper only needs the tip
/// of the default branch. Local sources get a full clone since libgit2 does
/// not support shallow local transports.
pub fn clone(url: &str, target: &Path) -> Result<Repository> {
    let mut callbacks = RemoteCallbacks::new();
    setup_auth_callbacks(&mut callbacks);

    let mut fetch_options = FetchOptions::new();
    fetch_options.remote_callbacks(callbacks);
    if !is_local(url) {
        fetch_options.depth(1);
    }

    let mut builder = RepoBuilder::new();
    builder.fetch_options(fetch_options);

    let url_to_clone = normalize_ssh_url(url);
    builder
        .clone(url_to_clone.as_ref(), target)
        .map_err(|e| BootstrapError::GitCloneFailed {
            url: url.to_string(),
            reason: interpret_git_error(&e),
        })
}

/// Short SHA of HEAD, for status lines
pub fn head_short_sha(path: &Path) -> Option<String> {
    let repo = Repository::open(path).ok()?;
    let commit = repo.head().ok()?.peel_to_commit().ok()?;
    let sha = commit.id().to_string();
    Some(sha.chars().take(8).collect())
}

fn setup_auth_callbacks(callbacks: &mut RemoteCallbacks) {
    callbacks.credentials(|url, username_from_url, allowed_types| {
        if allowed_types.contains(CredentialType::DEFAULT) {
            return Cred::default();
        }

        if allowed_types.contains(CredentialType::SSH_KEY) {
            if let Some(username) = username_from_url {
                if let Ok(cred) = Cred::ssh_key_from_agent(username) {
                    return Ok(cred);
                }

                let ssh_dir = dirs::home_dir().unwrap_or_default().join(".ssh");
                for key_name in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                    let private_key = ssh_dir.join(key_name);
                    if !private_key.exists() {
                        continue;
                    }
                    let public_key_path = ssh_dir.join(format!("{key_name}.pub"));
                    let public_key = public_key_path
                        .exists()
                        .then_some(public_key_path.as_path());
                    if let Ok(cred) = Cred::ssh_key(username, public_key, &private_key, None) {
                        return Ok(cred);
                    }
                }
            }
        }

        if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) {
            if let Ok(config) = git2::Config::open_default() {
                if let Ok(cred) = Cred::credential_helper(&config, url, username_from_url) {
                    return Ok(cred);
                }
            }
            // Public HTTPS repositories: let the server answer for itself
            if let Ok(cred) = Cred::userpass_plaintext("", "") {
                return Ok(cred);
            }
        }

        Err(git2::Error::new(
            git2::ErrorCode::Auth,
            git2::ErrorClass::Http,
            "authentication failed",
        ))
    });
}
