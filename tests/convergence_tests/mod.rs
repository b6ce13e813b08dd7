mod error_estimation;
