pub mod topic_broadcaster;
