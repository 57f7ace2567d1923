use colored::Colorize;
use modcon_core::action::ActionKind;
use modcon_core::collection::default_registry;

/// Prints every collection with its actions.
///
/// `*` marks actions that need a reason, `!` actions that ask for
/// confirmation.
pub fn list() {
    for collection in default_registry().iter() {
        println!(
            "{}  {}",
            collection.id.as_str().bold(),
            collection.title.dimmed()
        );
        let actions: Vec<String> = collection
            .actions
            .iter()
            .map(|action| {
                let mut label = action.name.to_string();
                if action.reason.is_required() {
                    label.push('*');
                }
                if action.kind == ActionKind::DestructiveBatch {
                    label.push('!');
                }
                label
            })
            .collect();
        println!("    {}", actions.join(", "));
    }
}
