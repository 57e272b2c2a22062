pub mod light_loss_pipeline;
