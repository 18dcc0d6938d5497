//! Movie metadata: the OMDb client and the fields we display from it

pub mod omdb;
pub mod ratings;

pub use omdb::{LookupError, MetadataSource, OmdbClient};
pub use ratings::{parse_awards, rotten_tomatoes_slug, AwardsTally, LinkTarget, MovieRatings};
