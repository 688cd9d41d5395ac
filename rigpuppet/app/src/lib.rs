pub mod replay;
pub mod rig_file;
