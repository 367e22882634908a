mod url;
mod visibility;
mod redirect;
mod access;

pub use url::*;
pub use visibility::*;
pub use redirect::*;
pub use access::*;
