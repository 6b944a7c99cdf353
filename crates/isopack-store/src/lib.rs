mod fs_ops;
mod index;
mod layout;

pub use fs_ops::{
    bin_path, expose_binary, install_tree, remove_exposed_binary, uninstall_package, write_spec,
};
pub use index::InstalledIndex;
pub use layout::StoreLayout;
