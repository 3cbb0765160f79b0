//! Account login
//!
//! One-shot mail/password login, run before any capture when credentials
//! are supplied. Any step failing is fatal; there is no retry.

use crate::browser::wait::{self, WaitOptions};
use crate::error::{Error, NavigationError, Result};
use chromiumoxide::Page;
use tracing::{info, instrument};

const LOGIN_URL: &str = "https://comic.k-manga.jp/login/mail";

/// Decide whether to log in from the optionally-supplied credentials.
///
/// Supplying either credential means the run wants an authenticated
/// session, so the other one missing is a configuration error: capturing
/// with half a credential would silently save logged-out content.
pub fn credentials<'a>(
    mail: Option<&'a str>,
    password: Option<&'a str>,
) -> Result<Option<(&'a str, &'a str)>> {
    match (mail, password) {
        (Some(mail), Some(password)) => Ok(Some((mail, password))),
        (None, None) => Ok(None),
        (Some(_), None) => Err(Error::Config(
            "mail is set but password is missing".to_string(),
        )),
        (None, Some(_)) => Err(Error::Config(
            "password is set but mail is missing".to_string(),
        )),
    }
}
const SEL_MAIL: &str = "#login_mail";
const SEL_PASSWORD: &str = "#login_password";
const SEL_SUBMIT: &str = "form[name=login] .form-base--submit";

/// Fill and submit the mail login form, waiting for the post-login
/// navigation to finish.
#[instrument(skip_all)]
pub async fn login(page: &Page, mail: &str, password: &str, opts: &WaitOptions) -> Result<()> {
    info!("logging in");
    wait::goto(page, LOGIN_URL, opts).await?;
    wait::wait_for_selector(page, SEL_MAIL, opts).await?;

    let mail_field = page.find_element(SEL_MAIL).await?;
    mail_field.click().await?;
    mail_field.type_str(mail).await?;

    let password_field = page.find_element(SEL_PASSWORD).await?;
    password_field.click().await?;
    password_field.type_str(password).await?;

    page.find_element(SEL_SUBMIT).await?.click().await?;

    tokio::time::timeout(opts.timeout, page.wait_for_navigation())
        .await
        .map_err(|_| NavigationError::Timeout {
            what: "post-login navigation".to_string(),
            timeout_ms: opts.timeout.as_millis() as u64,
        })?
        .map_err(|e| NavigationError::LoadFailed(e.to_string()))?;

    info!("login complete");
    Ok(())
}
