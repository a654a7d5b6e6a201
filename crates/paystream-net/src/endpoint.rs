use url::Url;

use crate::error::{NetError, NetResult};

/// Append path segments to `base`, percent-encoding each one.
///
/// Works whether or not `base` ends with a slash, unlike [`Url::join`]
/// which drops the last segment of a slash-less base.
///
/// # Errors
///
/// [`NetError::InvalidUrl`] if `base` cannot carry a path (`mailto:`, `data:`).
pub fn endpoint(base: &Url, segments: &[&str]) -> NetResult<Url> {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|()| NetError::InvalidUrl(format!("{base} cannot be a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
