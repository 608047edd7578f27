//! Property metadata: schemas derived from `@property` documentation.

pub mod descriptor;
pub mod docblock;
pub mod options;
pub mod registry;

pub use descriptor::{PropertyDescriptor, Schema, TypeRef};
pub use docblock::{DocBlockError, PropertyTag, parse_property_tags};
pub use options::{OptionKey, OptionValue, Options, parse_options};
pub use registry::{TypeDoc, Use, register_entity, register_type, schema_for};

use tracing::warn;

/// Builds the merged schema of `doc` across its ancestors.
///
/// Ancestors without a documentation block, or with a malformed one,
/// contribute nothing. A redeclared property replaces the inherited
/// descriptor as a whole.
pub fn build_schema(doc: &'static TypeDoc) -> Schema {
    let mut schema = Schema::new();

    for class in doc.ancestors() {
        register_entity(class);

        let Some(text) = class.doc else {
            continue;
        };

        let tags = match parse_property_tags(text) {
            Ok(tags) => tags,
            Err(err) => {
                warn!(
                    "Ignoring documentation of {}: {}",
                    class.qualified_name(),
                    err
                );
                continue;
            }
        };

        for tag in tags {
            let ty = class.resolve(&tag.type_token);
            let options = parse_options(&tag.description);
            schema.insert(PropertyDescriptor::new(tag.name, ty, options));
        }
    }

    schema
}
