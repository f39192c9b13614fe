mod edge_case_tests;
mod propagation_tests;
