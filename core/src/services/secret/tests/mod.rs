mod secret_tests;
