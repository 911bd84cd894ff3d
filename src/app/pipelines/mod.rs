pub mod proposal_pipeline;
