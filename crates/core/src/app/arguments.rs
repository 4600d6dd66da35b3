use crate::domain::version::QualifiedItem;
use crate::error::{CoreError, Result};

/// What a command accepts in its free arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArgumentRules {
    pub allow_versions: bool,
    pub allow_ranges: bool,
    pub allow_deletion_ids: bool,
    /// Require at least one argument
    pub require_items: bool,
}

/// Parse free command arguments into qualified items, rejecting anything
/// the command does not accept before any server call is made.
pub fn parse_qualified_items(args: &[String], rules: ArgumentRules) -> Result<Vec<QualifiedItem>> {
    if rules.require_items && args.is_empty() {
        return Err(CoreError::invalid_argument("at least one item must be specified"));
    }

    args.iter()
        .map(|arg| {
            let item: QualifiedItem = arg.parse()?;
            if item.version.is_some() && !rules.allow_versions {
                return Err(CoreError::invalid_argument(format!(
                    "'{}': a version may not be specified for this command",
                    arg
                )));
            }
            if item.is_range() && !rules.allow_ranges {
                return Err(CoreError::invalid_argument(format!(
                    "'{}': a version range may not be specified for this command",
                    arg
                )));
            }
            if item.deletion_id.is_some() && !rules.allow_deletion_ids {
                return Err(CoreError::invalid_argument(format!(
                    "'{}': a deletion id may not be specified for this command",
                    arg
                )));
            }
            Ok(item)
        })
        .collect()
}

/// The bare paths of parsed items, in argument order.
pub fn item_paths(items: &[QualifiedItem]) -> Vec<String> {
    items.iter().map(|item| item.path.clone()).collect()
}
